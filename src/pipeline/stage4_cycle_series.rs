use anyhow::{Context, Result};
use tracing::info;

use crate::ctx::Ctx;
use crate::engine::{Diagnostics, evaluate_history};
use crate::pipeline::Stage;

pub struct Stage4CycleSeries;

impl Stage4CycleSeries {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage4CycleSeries {
    fn name(&self) -> &'static str {
        "stage4_cycle_series"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        if ctx.inputs.history.is_empty() {
            return Ok(());
        }
        let mut diag = Diagnostics::default();
        let series = evaluate_history(&ctx.request, &ctx.inputs.history, ctx.rules()?, &mut diag)
            .context("cycle series failed")?;
        info!(
            sites = series.len(),
            failures = diag.failures.len(),
            "cycle_series_ready"
        );
        ctx.outcome.series = series;
        ctx.outcome.failures.extend(diag.failures);
        ctx.outcome.warnings.extend(diag.warnings);
        Ok(())
    }
}
