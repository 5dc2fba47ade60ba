//! Quantile/whisker trimming of a numeric cohort.
//!
//! Quantiles are nearest-rank (`round(p * (n - 1))` over the sorted cohort).
//! The trim is a single pass against the bounds of the unfiltered input.

use serde::{Deserialize, Serialize};

use crate::math::stats::{median_sorted, quantile_sorted, sort_values};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutlierFilter {
    pub lower_quantile: f64,
    pub upper_quantile: f64,
    pub whisker: f64,
}

impl Default for OutlierFilter {
    fn default() -> Self {
        Self {
            lower_quantile: 0.15,
            upper_quantile: 0.85,
            whisker: 1.5,
        }
    }
}

/// Bounds from a single pass over one set of values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutlierBounds {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower: f64,
    pub upper: f64,
}

impl OutlierBounds {
    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

/// Answers whether a value would have been trimmed from the cohort.
pub trait OutlierPredicate {
    fn is_outlier(&self, value: f64) -> bool;
}

impl OutlierPredicate for OutlierBounds {
    fn is_outlier(&self, value: f64) -> bool {
        !self.contains(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredCohort {
    /// Bounds over the unfiltered cohort.
    pub bounds: OutlierBounds,
    pub kept: Vec<f64>,
    pub excluded: Vec<f64>,
}

impl OutlierPredicate for FilteredCohort {
    fn is_outlier(&self, value: f64) -> bool {
        self.bounds.is_outlier(value)
    }
}

impl OutlierFilter {
    pub fn validate(&self) -> Result<(), String> {
        let in_unit = |q: f64| (0.0..=1.0).contains(&q);
        if !in_unit(self.lower_quantile) || !in_unit(self.upper_quantile) {
            return Err("outlier quantiles must be within [0, 1]".to_string());
        }
        if self.lower_quantile > self.upper_quantile {
            return Err("lower quantile exceeds upper quantile".to_string());
        }
        if self.whisker.is_nan() || self.whisker < 0.0 {
            return Err("whisker multiplier must be >= 0".to_string());
        }
        Ok(())
    }

    /// Single-pass bounds. `None` when there are no finite values.
    pub fn bounds(&self, values: &[f64]) -> Option<OutlierBounds> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sort_values(&mut sorted);
        let q1 = quantile_sorted(&sorted, self.lower_quantile);
        let q3 = quantile_sorted(&sorted, self.upper_quantile);
        let iqr = q3 - q1;
        Some(OutlierBounds {
            q1,
            median: median_sorted(&sorted),
            q3,
            iqr,
            lower: q1 - self.whisker * iqr,
            upper: q3 + self.whisker * iqr,
        })
    }

    /// One pass: keep the finite values inside the bounds of the input.
    pub fn fit(&self, values: &[f64]) -> Option<FilteredCohort> {
        let bounds = self.bounds(values)?;
        let (kept, excluded): (Vec<f64>, Vec<f64>) = values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .partition(|v| bounds.contains(*v));
        Some(FilteredCohort {
            bounds,
            kept,
            excluded,
        })
    }

    pub fn apply(&self, values: &[f64]) -> Vec<f64> {
        self.fit(values).map(|f| f.kept).unwrap_or_default()
    }
}
