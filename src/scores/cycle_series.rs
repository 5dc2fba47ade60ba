//! Cross-cycle standardized scores per site.
//!
//! Scores use the mean and sample standard deviation of every numeric value in
//! the cycle, without outlier trimming.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::math::stats::{mean, sample_std};
use crate::rules::QuantityRule;
use crate::scores::{
    CycleScore, PerformanceSummary, RawValue, SiteSeries, UnitFailure, ZScoreRecord,
};

/// Mean and sample std over the unfiltered cohort of one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawCohortStat {
    pub mean: f64,
    pub std: f64,
    pub n: usize,
}

impl RawCohortStat {
    pub fn compute(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        Some(Self {
            mean: mean(values),
            std: sample_std(values),
            n: values.len(),
        })
    }

    pub fn zscore(&self, value: f64) -> f64 {
        if self.std == 0.0 || !self.std.is_finite() {
            return 0.0;
        }
        (value - self.mean) / self.std
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceBucket {
    Acceptable,
    Warning,
    Unacceptable,
}

/// Bucket for one cycle score. Scores with 2 < |z| < 3 fall in no bucket.
pub fn bucket(score: &CycleScore) -> Option<PerformanceBucket> {
    let z = match score {
        CycleScore::NoSubmission => return Some(PerformanceBucket::Unacceptable),
        CycleScore::Score(z) => z.abs(),
    };
    if z <= 1.0 {
        Some(PerformanceBucket::Acceptable)
    } else if z <= 2.0 {
        Some(PerformanceBucket::Warning)
    } else if z >= 3.0 {
        Some(PerformanceBucket::Unacceptable)
    } else {
        None
    }
}

/// Length of the no-submission run ending at the last score.
pub fn consecutive_no_submissions(scores: &[CycleScore]) -> usize {
    scores
        .iter()
        .rev()
        .take_while(|s| matches!(s, CycleScore::NoSubmission))
        .count()
}

pub fn summarize(site_id: &str, scores: &[CycleScore]) -> PerformanceSummary {
    let mut summary = PerformanceSummary {
        site_id: site_id.to_string(),
        acceptable_count: 0,
        warning_count: 0,
        unacceptable_count: 0,
        consecutive_no_submissions: consecutive_no_submissions(scores),
    };
    for score in scores {
        match bucket(score) {
            Some(PerformanceBucket::Acceptable) => summary.acceptable_count += 1,
            Some(PerformanceBucket::Warning) => summary.warning_count += 1,
            Some(PerformanceBucket::Unacceptable) => summary.unacceptable_count += 1,
            None => {}
        }
    }
    summary
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRow {
    pub site_id: String,
    pub values: Vec<RawValue>,
}

/// One quantity's values per site across ordered cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalTable {
    pub quantity_id: String,
    pub cycles: Vec<String>,
    pub rows: Vec<HistoryRow>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrackedQuantity {
    pub cycles: Vec<String>,
    pub cohort: Vec<Option<RawCohortStat>>,
    pub series: Vec<SiteSeries>,
    pub failures: Vec<UnitFailure>,
}

/// Scores every site of `table` over the cycles up to and including
/// `selected_cycle`. Rows of the wrong width are reported as failures and
/// left out of the cohort. `rule`, when known, decides how text cells read.
pub fn track(
    table: &HistoricalTable,
    selected_cycle: &str,
    rule: Option<&QuantityRule>,
) -> EngineResult<TrackedQuantity> {
    let pos = table
        .cycles
        .iter()
        .position(|c| c == selected_cycle)
        .ok_or_else(|| EngineError::UnknownCycle(selected_cycle.to_string()))?;
    let width = pos + 1;
    let cycles = table.cycles[..width].to_vec();

    let coerce = |raw: &RawValue| match rule {
        Some(rule) => rule.coerce(raw),
        None => raw.as_number(),
    };

    let mut failures = Vec::new();
    let mut numeric: Vec<(&str, Vec<Option<f64>>)> = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        if row.values.len() != table.cycles.len() {
            let err = EngineError::HistoryShape {
                site_id: row.site_id.clone(),
                got: row.values.len(),
                expected: table.cycles.len(),
            };
            failures.push(UnitFailure {
                unit: format!("{}/{}", table.quantity_id, row.site_id),
                message: err.to_string(),
            });
            continue;
        }
        let values = row.values[..width].iter().map(coerce).collect();
        numeric.push((row.site_id.as_str(), values));
    }

    let cohort: Vec<Option<RawCohortStat>> = (0..width)
        .map(|c| {
            let column: Vec<f64> = numeric.iter().filter_map(|(_, v)| v[c]).collect();
            RawCohortStat::compute(&column)
        })
        .collect();

    let series = numeric
        .iter()
        .map(|(site_id, values)| {
            let scores: Vec<CycleScore> = values
                .iter()
                .zip(cohort.iter())
                .map(|(value, stat)| match (value, stat) {
                    (Some(v), Some(stat)) => CycleScore::Score(stat.zscore(*v)),
                    (Some(_), None) => CycleScore::Score(0.0),
                    (None, _) => CycleScore::NoSubmission,
                })
                .collect();
            let records = cycles
                .iter()
                .zip(scores.iter())
                .map(|(cycle_id, score)| ZScoreRecord {
                    site_id: site_id.to_string(),
                    cycle_id: cycle_id.clone(),
                    quantity_id: table.quantity_id.clone(),
                    score: *score,
                })
                .collect();
            SiteSeries {
                site_id: site_id.to_string(),
                quantity_id: table.quantity_id.clone(),
                records,
                summary: summarize(site_id, &scores),
            }
        })
        .collect();

    Ok(TrackedQuantity {
        cycles,
        cohort,
        series,
        failures,
    })
}
