use anyhow::Result;
use tracing::info;

use crate::ctx::Ctx;
use crate::engine::evaluate_vitals;
use crate::pipeline::Stage;
use crate::scores::trend::TrendDetector;

pub struct Stage5Trend {
    detector: TrendDetector,
}

impl Stage5Trend {
    pub fn new() -> Self {
        Self {
            detector: TrendDetector::default(),
        }
    }

    pub fn with_detector(detector: TrendDetector) -> Self {
        Self { detector }
    }
}

impl Stage for Stage5Trend {
    fn name(&self) -> &'static str {
        "stage5_trend"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        if ctx.inputs.vitals.is_empty() {
            return Ok(());
        }
        let outcome = evaluate_vitals(&ctx.request, &ctx.inputs.vitals, &self.detector);
        info!(
            results = outcome.trends.len(),
            escalations = outcome.escalations.len(),
            today = %ctx.request.today,
            "trend_ready"
        );
        ctx.outcome.trends = outcome.trends;
        ctx.outcome.escalations = outcome.escalations;
        Ok(())
    }
}
