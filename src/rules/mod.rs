mod loader;

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::scores::outlier::OutlierFilter;
use crate::scores::RawValue;

pub use loader::{load_builtin_v1, load_rules_tsv, merge_rules, parse_rules_tsv};

/// Decimal places beyond this lose meaning in an `f64`.
pub const MAX_PRECISION: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CenterStatistic {
    Median,
    Mean,
}

/// Whether a center equal to the threshold already switches to the
/// relative tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdMode {
    Above,
    AtOrAbove,
}

/// A quantity computed per site and cycle from two submitted ones, as
/// `numerator / denominator * factor` (written `a/b*100` in the table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedRatio {
    pub numerator: String,
    pub denominator: String,
    pub factor: f64,
}

impl DerivedRatio {
    pub fn parse(expr: &str) -> Option<Self> {
        let (ratio, factor) = match expr.split_once('*') {
            Some((ratio, factor)) => (ratio, factor.trim().parse::<f64>().ok()?),
            None => (expr, 1.0),
        };
        let (numerator, denominator) = ratio.split_once('/')?;
        let (numerator, denominator) = (numerator.trim(), denominator.trim());
        if numerator.is_empty() || denominator.is_empty() || !factor.is_finite() {
            return None;
        }
        Some(Self {
            numerator: numerator.to_string(),
            denominator: denominator.to_string(),
            factor,
        })
    }

    /// `None` when the denominator is zero.
    pub fn apply(&self, numerator: f64, denominator: f64) -> Option<f64> {
        if denominator == 0.0 {
            return None;
        }
        Some(numerator / denominator * self.factor)
    }
}

impl std::fmt::Display for DerivedRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}*{}", self.numerator, self.denominator, self.factor)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantityRule {
    pub id: String,
    pub display_name: String,
    pub units: String,
    pub center: CenterStatistic,
    pub threshold: f64,
    pub threshold_mode: ThresholdMode,
    pub below_delta: f64,
    pub above_fraction: f64,
    pub precision: u32,
    pub center_precision: Option<u32>,
    pub censored_substitute: Option<f64>,
    pub outlier: OutlierFilter,
    pub alp_note: String,
    pub derived: Option<DerivedRatio>,
}

impl QuantityRule {
    /// Program prefix of the id (`epoc` for `epoc.na`).
    pub fn program(&self) -> &str {
        self.id.split_once('.').map(|(p, _)| p).unwrap_or("")
    }

    pub fn uses_relative(&self, center: f64) -> bool {
        match self.threshold_mode {
            ThresholdMode::Above => center > self.threshold,
            ThresholdMode::AtOrAbove => center >= self.threshold,
        }
    }

    /// Numeric reading of a raw cell. Below-detection tokens such as `<40`
    /// map to the censored substitute when the rule defines one.
    pub fn coerce(&self, raw: &RawValue) -> Option<f64> {
        match raw {
            RawValue::Number(v) if v.is_finite() => Some(*v),
            RawValue::Number(_) | RawValue::Absent => None,
            RawValue::Text(t) => {
                if t.trim_start().starts_with('<') {
                    self.censored_substitute
                } else {
                    None
                }
            }
        }
    }

    pub fn validate(&self) -> EngineResult<()> {
        let invalid = |reason: &str| EngineError::InvalidRule {
            id: self.id.clone(),
            reason: reason.to_string(),
        };
        if self.id.trim().is_empty() {
            return Err(invalid("empty id"));
        }
        if self.threshold.is_nan() {
            return Err(invalid("threshold is NaN"));
        }
        if self.below_delta.is_nan() || self.below_delta < 0.0 {
            return Err(invalid("below_delta must be >= 0"));
        }
        if !(0.0..=1.0).contains(&self.above_fraction) {
            return Err(invalid("above_fraction must be within [0, 1]"));
        }
        if self.precision > MAX_PRECISION {
            return Err(invalid("precision must be at most 15"));
        }
        if self.center_precision.is_some_and(|p| p > MAX_PRECISION) {
            return Err(invalid("center_precision must be at most 15"));
        }
        self.outlier
            .validate()
            .map_err(|reason| invalid(&reason))?;
        if let Some(ratio) = &self.derived {
            if ratio.numerator == self.id || ratio.denominator == self.id {
                return Err(invalid("derived quantity refers to itself"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct RuleTable {
    pub version: String,
    rules: Vec<QuantityRule>,
    index: HashMap<String, usize>,
}

impl RuleTable {
    pub fn new(version: impl Into<String>, rules: Vec<QuantityRule>) -> Self {
        let mut index = HashMap::with_capacity(rules.len());
        for (i, rule) in rules.iter().enumerate() {
            index.entry(rule.id.clone()).or_insert(i);
        }
        Self {
            version: version.into(),
            rules,
            index,
        }
    }

    pub fn get(&self, quantity_id: &str) -> EngineResult<&QuantityRule> {
        self.index
            .get(quantity_id)
            .map(|&i| &self.rules[i])
            .ok_or_else(|| EngineError::UnknownQuantity(quantity_id.to_string()))
    }

    pub fn rules(&self) -> &[QuantityRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules whose values are computed from other submitted quantities.
    pub fn derived(&self) -> impl Iterator<Item = (&QuantityRule, &DerivedRatio)> {
        self.rules
            .iter()
            .filter_map(|r| r.derived.as_ref().map(|d| (r, d)))
    }

    /// Submitted quantities that only feed a derivation and have no rule of
    /// their own.
    pub fn is_input_only(&self, quantity_id: &str) -> bool {
        !self.index.contains_key(quantity_id)
            && self
                .derived()
                .any(|(_, d)| d.numerator == quantity_id || d.denominator == quantity_id)
    }

    pub fn programs(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for rule in &self.rules {
            let p = rule.program();
            if !out.contains(&p) {
                out.push(p);
            }
        }
        out
    }
}

pub fn load_builtin() -> Result<RuleTable> {
    let rules = load_builtin_v1()?;
    Ok(RuleTable::new("v1", rules))
}

/// Built-in table with an optional user overlay merged by id.
pub fn load_with_overlay(path: Option<&Path>) -> Result<RuleTable> {
    let mut rules = load_builtin_v1()?;
    if let Some(path) = path {
        let user = load_rules_tsv(path)?;
        rules = merge_rules(rules, user);
    }
    Ok(RuleTable::new("v1", rules))
}
