//! One evaluation pass over already-loaded tables.
//!
//! Every unit (quantity per cycle, historical quantity, patient metric) is
//! evaluated on its own; a failing unit is recorded and the pass goes on.
//! Only a selected cycle that the history does not contain aborts the pass.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ctx::EvalRequest;
use crate::error::{EngineError, EngineResult};
use crate::rules::RuleTable;
use crate::scores::classify::classify_sites;
use crate::scores::cycle_series::{HistoricalTable, track};
use crate::scores::derived::derive_samples;
use crate::scores::reference::ReferenceRangeCalculator;
use crate::scores::trend::{TrendDetector, escalations};
use crate::scores::{
    ClassificationResult, CohortSample, EscalationEvent, ReferenceRange, SiteSeries, TrendResult,
    TrendSample, UnitFailure,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvalInputs {
    pub cohort: Vec<CohortSample>,
    pub history: Vec<HistoricalTable>,
    pub vitals: Vec<TrendSample>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CohortOutcome {
    pub ranges: Vec<ReferenceRange>,
    pub classifications: Vec<ClassificationResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VitalsOutcome {
    pub trends: Vec<TrendResult>,
    pub escalations: Vec<EscalationEvent>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationOutcome {
    pub ranges: Vec<ReferenceRange>,
    pub classifications: Vec<ClassificationResult>,
    pub series: Vec<SiteSeries>,
    pub trends: Vec<TrendResult>,
    pub escalations: Vec<EscalationEvent>,
    pub failures: Vec<UnitFailure>,
    pub warnings: Vec<String>,
}

/// Collects unit failures and warnings raised while a pass runs.
#[derive(Debug, Default)]
pub struct Diagnostics {
    pub failures: Vec<UnitFailure>,
    pub warnings: Vec<String>,
}

impl Diagnostics {
    pub fn fail(&mut self, unit: String, err: &EngineError) {
        warn!(unit = %unit, error = %err, "unit failed");
        self.failures.push(UnitFailure {
            unit,
            message: err.to_string(),
        });
    }

    pub fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message);
    }
}

fn program_of(quantity_id: &str) -> &str {
    quantity_id.split_once('.').map(|(p, _)| p).unwrap_or(quantity_id)
}

fn in_program(request: &EvalRequest, quantity_id: &str) -> bool {
    match &request.program {
        Some(program) => program_of(quantity_id).eq_ignore_ascii_case(program),
        None => true,
    }
}

/// Reference ranges and per-site classifications for every quantity and
/// cycle of the cohort table, derived quantities included. With a selected
/// cycle, other cycles are skipped.
pub fn evaluate_cohort(
    request: &EvalRequest,
    cohort: &[CohortSample],
    rules: &RuleTable,
    diag: &mut Diagnostics,
) -> CohortOutcome {
    let selected = |s: &&CohortSample| match &request.selected_cycle {
        Some(cycle) => &s.cycle_id == cycle,
        None => true,
    };

    let derived = derive_samples(cohort, rules);
    if !derived.is_empty() {
        debug!(samples = derived.len(), "derived quantities");
    }

    let mut sites_by_cycle: BTreeMap<&str, BTreeSet<String>> = BTreeMap::new();
    let mut groups: BTreeMap<(&str, &str), Vec<&CohortSample>> = BTreeMap::new();
    for sample in cohort
        .iter()
        .chain(derived.iter())
        .filter(selected)
        .filter(|s| in_program(request, &s.quantity_id))
    {
        if rules.is_input_only(&sample.quantity_id) {
            continue;
        }
        sites_by_cycle
            .entry(sample.cycle_id.as_str())
            .or_default()
            .insert(sample.site_id.clone());
        groups
            .entry((sample.cycle_id.as_str(), sample.quantity_id.as_str()))
            .or_default()
            .push(sample);
    }

    let calculator = ReferenceRangeCalculator::new(rules);
    let mut outcome = CohortOutcome::default();

    for ((cycle_id, quantity_id), samples) in groups {
        let unit = format!("{}/{}", cycle_id, quantity_id);
        let rule = match rules.get(quantity_id) {
            Ok(rule) => rule,
            Err(err) => {
                diag.fail(unit, &err);
                continue;
            }
        };

        let mut values: BTreeMap<String, Option<f64>> = BTreeMap::new();
        for sample in samples {
            if values.contains_key(&sample.site_id) {
                diag.warn(format!(
                    "duplicate submission for site '{}' in {}; keeping the first",
                    sample.site_id, unit
                ));
                continue;
            }
            values.insert(sample.site_id.clone(), rule.coerce(&sample.value));
        }
        let numeric: Vec<f64> = values.values().filter_map(|v| *v).collect();

        let computed = match calculator.compute(quantity_id, cycle_id, &numeric) {
            Ok(computed) => computed,
            Err(err) => {
                diag.fail(unit, &err);
                continue;
            }
        };
        debug!(
            unit = %unit,
            center = computed.range.center,
            lower = computed.range.lower_limit,
            upper = computed.range.upper_limit,
            excluded = computed.range.excluded_count,
            "reference range"
        );

        let empty = BTreeSet::new();
        let sites = sites_by_cycle.get(cycle_id).unwrap_or(&empty);
        outcome.classifications.extend(classify_sites(
            sites,
            &values,
            &computed.range,
            &computed.cohort,
        ));
        outcome.ranges.push(computed.range);
    }

    outcome
}

/// Cross-cycle scores for every historical quantity. Without a selected
/// cycle each table is scored up to its last cycle.
pub fn evaluate_history(
    request: &EvalRequest,
    history: &[HistoricalTable],
    rules: &RuleTable,
    diag: &mut Diagnostics,
) -> EngineResult<Vec<SiteSeries>> {
    let mut series = Vec::new();
    for table in history.iter().filter(|t| in_program(request, &t.quantity_id)) {
        let selected = match (&request.selected_cycle, table.cycles.last()) {
            (Some(cycle), _) => cycle.as_str(),
            (None, Some(last)) => last.as_str(),
            (None, None) => {
                diag.warn(format!("history for '{}' has no cycles", table.quantity_id));
                continue;
            }
        };
        let tracked = track(table, selected, rules.get(&table.quantity_id).ok())?;
        for failure in tracked.failures {
            warn!(unit = %failure.unit, error = %failure.message, "unit failed");
            diag.failures.push(failure);
        }
        series.extend(tracked.series);
    }
    Ok(series)
}

pub fn evaluate_vitals(
    request: &EvalRequest,
    vitals: &[TrendSample],
    detector: &TrendDetector,
) -> VitalsOutcome {
    VitalsOutcome {
        trends: detector.detect_all(vitals),
        escalations: escalations(vitals, request.today),
    }
}

pub fn evaluate(
    request: &EvalRequest,
    inputs: &EvalInputs,
    rules: &RuleTable,
) -> EngineResult<EvaluationOutcome> {
    let mut diag = Diagnostics::default();
    let cohort = evaluate_cohort(request, &inputs.cohort, rules, &mut diag);
    let series = evaluate_history(request, &inputs.history, rules, &mut diag)?;
    let vitals = evaluate_vitals(request, &inputs.vitals, &TrendDetector::default());
    Ok(EvaluationOutcome {
        ranges: cohort.ranges,
        classifications: cohort.classifications,
        series,
        trends: vitals.trends,
        escalations: vitals.escalations,
        failures: diag.failures,
        warnings: diag.warnings,
    })
}
