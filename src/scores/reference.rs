use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::math::stats::{mean, median, round_half_up};
use crate::rules::{CenterStatistic, QuantityRule, RuleTable};
use crate::scores::outlier::FilteredCohort;
use crate::scores::{ReferenceRange, ToleranceBranch};

/// Center statistic over the outlier-filtered cohort. Kept apart from the
/// unfiltered mean/std used for z-scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilteredCohortStat {
    pub statistic: CenterStatistic,
    pub value: f64,
    pub n: usize,
}

impl FilteredCohortStat {
    pub fn compute(statistic: CenterStatistic, values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let value = match statistic {
            CenterStatistic::Median => {
                let mut scratch = values.to_vec();
                median(&mut scratch)
            }
            CenterStatistic::Mean => mean(values),
        };
        Some(Self {
            statistic,
            value,
            n: values.len(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComputedRange {
    pub range: ReferenceRange,
    pub cohort: FilteredCohort,
}

pub struct ReferenceRangeCalculator<'a> {
    rules: &'a RuleTable,
}

impl<'a> ReferenceRangeCalculator<'a> {
    pub fn new(rules: &'a RuleTable) -> Self {
        Self { rules }
    }

    /// Trims `values` (the unfiltered numeric cohort) and derives the range.
    pub fn compute(
        &self,
        quantity_id: &str,
        cycle_id: &str,
        values: &[f64],
    ) -> EngineResult<ComputedRange> {
        let rule = self.rules.get(quantity_id)?;
        let empty = || EngineError::EmptyCohort {
            quantity_id: quantity_id.to_string(),
            cycle_id: cycle_id.to_string(),
        };
        let cohort = rule.outlier.fit(values).ok_or_else(empty)?;
        let stat = FilteredCohortStat::compute(rule.center, &cohort.kept).ok_or_else(empty)?;
        let range = range_from_center(rule, cycle_id, stat.value, stat.n, cohort.excluded.len());
        Ok(ComputedRange { range, cohort })
    }
}

/// Applies the rule's two-branch tolerance around `center` and rounds.
pub fn range_from_center(
    rule: &QuantityRule,
    cycle_id: &str,
    center: f64,
    sample_count: usize,
    excluded_count: usize,
) -> ReferenceRange {
    let center = match rule.center_precision {
        Some(places) => round_half_up(center, places),
        None => center,
    };

    let (branch, a, b) = if rule.uses_relative(center) {
        (
            ToleranceBranch::Relative,
            center * (1.0 - rule.above_fraction),
            center * (1.0 + rule.above_fraction),
        )
    } else {
        (
            ToleranceBranch::Absolute,
            center - rule.below_delta,
            center + rule.below_delta,
        )
    };

    ReferenceRange {
        quantity_id: rule.id.clone(),
        cycle_id: cycle_id.to_string(),
        center: round_half_up(center, rule.precision),
        lower_limit: round_half_up(a.min(b), rule.precision),
        upper_limit: round_half_up(a.max(b), rule.precision),
        sample_count,
        excluded_count,
        branch,
    }
}
