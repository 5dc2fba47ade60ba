use crate::ctx::Ctx;
use crate::scores::{Compliance, Interpretation, TrendPresence};

pub fn format_summary(ctx: &Ctx) -> String {
    let version = env!("CARGO_PKG_VERSION");
    let outcome = &ctx.outcome;
    let count = |i: Interpretation| {
        outcome
            .classifications
            .iter()
            .filter(|c| c.interpretation == i)
            .count()
    };
    let non_compliant = outcome
        .series
        .iter()
        .filter(|s| s.summary.compliance() == Compliance::NonCompliant)
        .count();
    let detected = outcome
        .trends
        .iter()
        .filter(|t| t.trend == TrendPresence::Detected)
        .count();

    let mut out = String::new();
    out.push_str(&format!("kira-peerqc v{}\n", version));
    if let Some(cycle) = &ctx.request.selected_cycle {
        out.push_str(&format!("Cycle: {}\n", cycle));
    }
    out.push_str(&format!(
        "Ranges: {}, results: {} acceptable, {} unacceptable, {} no submission\n",
        outcome.ranges.len(),
        count(Interpretation::Acceptable),
        count(Interpretation::Unacceptable),
        count(Interpretation::NoSubmission)
    ));
    out.push_str(&format!(
        "Sites tracked: {} ({} non-compliant)\n",
        outcome.series.len(),
        non_compliant
    ));
    out.push_str(&format!(
        "Trends: {} detected of {}\n",
        detected,
        outcome.trends.len()
    ));
    if outcome.escalations.is_empty() {
        out.push_str("Escalations: none\n");
    } else {
        out.push_str(&format!("Escalations: {}\n", outcome.escalations.len()));
    }
    if !outcome.failures.is_empty() {
        out.push_str(&format!("Failed units: {}\n", outcome.failures.len()));
    }
    out
}
