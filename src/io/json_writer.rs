use std::collections::BTreeMap;

use anyhow::Result;

use crate::ctx::Ctx;
use crate::schema::v1::{InputCounts, PeerQcV1, QuantityBlock, RunMeta, SiteSeriesEntry};
use crate::scores::{ClassificationResult, Interpretation};

pub fn build_report(ctx: &Ctx) -> Result<PeerQcV1> {
    let rules = ctx.rules()?;
    let outcome = &ctx.outcome;

    let mut by_unit: BTreeMap<(&str, &str), Vec<&ClassificationResult>> = BTreeMap::new();
    for c in &outcome.classifications {
        by_unit
            .entry((c.cycle_id.as_str(), c.quantity_id.as_str()))
            .or_default()
            .push(c);
    }

    let quantities = outcome
        .ranges
        .iter()
        .map(|range| {
            let results: Vec<ClassificationResult> = by_unit
                .get(&(range.cycle_id.as_str(), range.quantity_id.as_str()))
                .map(|rows| rows.iter().map(|r| (*r).clone()).collect())
                .unwrap_or_default();
            let count = |i: Interpretation| results.iter().filter(|r| r.interpretation == i).count();
            let rule = rules.get(&range.quantity_id).ok();
            QuantityBlock {
                range: range.clone(),
                display_name: rule.map(|r| r.display_name.clone()).unwrap_or_default(),
                units: rule.map(|r| r.units.clone()).unwrap_or_default(),
                alp_note: rule.map(|r| r.alp_note.clone()).unwrap_or_default(),
                acceptable: count(Interpretation::Acceptable),
                unacceptable: count(Interpretation::Unacceptable),
                no_submission: count(Interpretation::NoSubmission),
                outliers: results.iter().filter(|r| r.is_outlier).count(),
                results,
            }
        })
        .collect();

    let site_series = outcome
        .series
        .iter()
        .map(|s| SiteSeriesEntry {
            site_id: s.site_id.clone(),
            quantity_id: s.quantity_id.clone(),
            compliance: s.summary.compliance(),
            summary: s.summary.clone(),
            records: s.records.clone(),
        })
        .collect();

    let mut warnings = ctx.warnings.clone();
    warnings.extend(outcome.warnings.iter().cloned());

    Ok(PeerQcV1 {
        tool: "kira-peerqc".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        schema_version: "v1".to_string(),
        run: RunMeta {
            issuer: ctx.request.issuer.clone(),
            today: ctx.request.today,
            selected_cycle: ctx.request.selected_cycle.clone(),
            program: ctx.request.program.clone(),
            rules_version: rules.version.clone(),
            rules_count: rules.len(),
        },
        inputs: InputCounts {
            cohort_rows: ctx.inputs.cohort.len(),
            history_tables: ctx.inputs.history.len(),
            vital_readings: ctx.inputs.vitals.len(),
        },
        quantities,
        site_series,
        trends: outcome.trends.clone(),
        escalations: outcome.escalations.clone(),
        failures: outcome.failures.clone(),
        warnings,
    })
}
