use std::collections::{BTreeMap, BTreeSet};

use crate::scores::outlier::OutlierPredicate;
use crate::scores::{ClassificationResult, Interpretation, ReferenceRange};

pub fn interpret(value: Option<f64>, range: &ReferenceRange) -> Interpretation {
    match value {
        None => Interpretation::NoSubmission,
        Some(v) if range.contains(v) => Interpretation::Acceptable,
        Some(_) => Interpretation::Unacceptable,
    }
}

/// Classifies one site's value. The outlier flag is only raised on
/// unacceptable values that the cohort trim would have excluded.
pub fn classify(
    site_id: &str,
    value: Option<f64>,
    range: &ReferenceRange,
    outliers: &dyn OutlierPredicate,
) -> ClassificationResult {
    let interpretation = interpret(value, range);
    let is_outlier = match (interpretation, value) {
        (Interpretation::Unacceptable, Some(v)) => outliers.is_outlier(v),
        _ => false,
    };
    ClassificationResult {
        site_id: site_id.to_string(),
        quantity_id: range.quantity_id.clone(),
        cycle_id: range.cycle_id.clone(),
        value,
        interpretation,
        is_outlier,
    }
}

/// Classifies every site in `sites` against one range. Sites without an
/// entry in `values` are no-submissions.
pub fn classify_sites(
    sites: &BTreeSet<String>,
    values: &BTreeMap<String, Option<f64>>,
    range: &ReferenceRange,
    outliers: &dyn OutlierPredicate,
) -> Vec<ClassificationResult> {
    sites
        .iter()
        .map(|site| {
            let value = values.get(site).copied().flatten();
            classify(site, value, range, outliers)
        })
        .collect()
}
