use anyhow::Result;
use std::time::Instant;
use tracing::{info, warn};

use crate::ctx::Ctx;

pub mod stage0_scaffold;
pub mod stage1_rules;
pub mod stage2_input;
pub mod stage3_reference;
pub mod stage4_cycle_series;
pub mod stage5_trend;
pub mod stage6_output;
pub mod stage_background;

use stage0_scaffold::Stage0Scaffold;
use stage1_rules::Stage1Rules;
use stage2_input::Stage2Input;
use stage3_reference::Stage3Reference;
use stage4_cycle_series::Stage4CycleSeries;
use stage5_trend::Stage5Trend;
use stage6_output::Stage6Output;
use stage_background::StageBackground;

pub trait Stage {
    fn name(&self) -> &'static str;
    fn run(&self, ctx: &mut Ctx) -> Result<()>;
}

pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// Load, evaluate each component in turn, write outputs.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(Stage0Scaffold::new()),
            Box::new(Stage1Rules::new()),
            Box::new(Stage2Input::new()),
            Box::new(Stage3Reference::new()),
            Box::new(Stage4CycleSeries::new()),
            Box::new(Stage5Trend::new()),
            Box::new(Stage6Output::new()),
        ])
    }

    /// Same inputs and outputs, evaluation on a background worker.
    pub fn background() -> Self {
        Self::new(vec![
            Box::new(Stage0Scaffold::new()),
            Box::new(Stage1Rules::new()),
            Box::new(Stage2Input::new()),
            Box::new(StageBackground::new()),
            Box::new(Stage6Output::new()),
        ])
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn run(&self, ctx: &mut Ctx) -> Result<()> {
        info!(
            today = %ctx.request.today,
            selected_cycle = ctx.request.selected_cycle.as_deref().unwrap_or("-"),
            "evaluation started"
        );
        for stage in &self.stages {
            let start = Instant::now();
            info!(stage = stage.name(), "stage started");
            if let Err(err) = stage.run(ctx) {
                let elapsed_ms = start.elapsed().as_millis();
                warn!(
                    stage = stage.name(),
                    elapsed_ms = elapsed_ms as u64,
                    "stage failed"
                );
                return Err(err);
            }
            let elapsed_ms = start.elapsed().as_millis();
            info!(
                stage = stage.name(),
                elapsed_ms = elapsed_ms as u64,
                "stage finished"
            );
        }
        Ok(())
    }
}
