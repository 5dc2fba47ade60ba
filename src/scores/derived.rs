//! Quantities computed per site from other submitted quantities, such as a
//! differential percentage from a cell count and the white cell count.

use std::collections::{HashMap, HashSet};

use crate::rules::RuleTable;
use crate::scores::{CohortSample, RawValue};

/// One derived sample per site and cycle that submitted the numerator. A
/// site that submitted the derived quantity directly keeps its own value.
/// A missing or non-numeric operand, or a zero denominator, gives an absent
/// value so the site is still classified.
pub fn derive_samples(cohort: &[CohortSample], rules: &RuleTable) -> Vec<CohortSample> {
    let mut index: HashMap<(&str, &str, &str), &RawValue> = HashMap::new();
    for s in cohort {
        index
            .entry((s.cycle_id.as_str(), s.site_id.as_str(), s.quantity_id.as_str()))
            .or_insert(&s.value);
    }

    let mut out = Vec::new();
    for (rule, ratio) in rules.derived() {
        let mut seen: HashSet<(&str, &str)> = HashSet::new();
        for s in cohort.iter().filter(|s| s.quantity_id == ratio.numerator) {
            let key = (s.cycle_id.as_str(), s.site_id.as_str());
            if !seen.insert(key) {
                continue;
            }
            if index.contains_key(&(key.0, key.1, rule.id.as_str())) {
                continue;
            }
            let numerator = s.value.as_number();
            let denominator = index
                .get(&(key.0, key.1, ratio.denominator.as_str()))
                .and_then(|v| v.as_number());
            let value = match (numerator, denominator) {
                (Some(n), Some(d)) => ratio.apply(n, d),
                _ => None,
            };
            out.push(CohortSample {
                site_id: s.site_id.clone(),
                quantity_id: rule.id.clone(),
                cycle_id: s.cycle_id.clone(),
                value: value.map(RawValue::Number).unwrap_or(RawValue::Absent),
            });
        }
    }
    out
}
