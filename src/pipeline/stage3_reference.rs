use anyhow::Result;
use tracing::info;

use crate::ctx::Ctx;
use crate::engine::{Diagnostics, evaluate_cohort};
use crate::pipeline::Stage;

/// Reference ranges and site classifications for the cohort table.
pub struct Stage3Reference;

impl Stage3Reference {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage3Reference {
    fn name(&self) -> &'static str {
        "stage3_reference"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        if ctx.inputs.cohort.is_empty() {
            return Ok(());
        }
        let mut diag = Diagnostics::default();
        let outcome = evaluate_cohort(&ctx.request, &ctx.inputs.cohort, ctx.rules()?, &mut diag);
        info!(
            ranges = outcome.ranges.len(),
            results = outcome.classifications.len(),
            failures = diag.failures.len(),
            "reference_ready"
        );
        ctx.outcome.ranges = outcome.ranges;
        ctx.outcome.classifications = outcome.classifications;
        ctx.outcome.failures.extend(diag.failures);
        ctx.outcome.warnings.extend(diag.warnings);
        Ok(())
    }
}
