use anyhow::{Context, Result};
use tracing::info;

use crate::background::spawn_evaluation;
use crate::ctx::Ctx;
use crate::pipeline::Stage;

/// Runs the whole evaluation on a worker and blocks on its completion.
pub struct StageBackground;

impl StageBackground {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for StageBackground {
    fn name(&self) -> &'static str {
        "stage_background"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let rules = ctx.rules()?.clone();
        let handle = spawn_evaluation(ctx.request.clone(), ctx.inputs.clone(), rules);
        let outcome = handle.wait().context("background evaluation failed")?;
        info!(
            ranges = outcome.ranges.len(),
            sites = outcome.series.len(),
            trends = outcome.trends.len(),
            "background_ready"
        );
        ctx.outcome = outcome;
        Ok(())
    }
}
