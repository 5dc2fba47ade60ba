use anyhow::{Result, bail};
use tracing::info;

use crate::ctx::Ctx;
use crate::io::tables::{read_cohort, read_history, read_vitals};
use crate::pipeline::Stage;

pub struct Stage2Input;

impl Stage2Input {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage2Input {
    fn name(&self) -> &'static str {
        "stage2_input"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let paths = ctx.inputs_paths.clone();
        if paths.cohort.is_none() && paths.history.is_none() && paths.vitals.is_none() {
            bail!("no input tables given (need at least one of cohort, history, vitals)");
        }

        if let Some(path) = &paths.cohort {
            let table = read_cohort(path)?;
            info!(path = %path.display(), rows = table.rows.len(), "cohort_loaded");
            ctx.warnings.extend(table.warnings);
            ctx.inputs.cohort = table.rows;
        }
        if let Some(path) = &paths.history {
            let table = read_history(path)?;
            info!(path = %path.display(), quantities = table.rows.len(), "history_loaded");
            ctx.warnings.extend(table.warnings);
            ctx.inputs.history = table.rows;
        }
        if let Some(path) = &paths.vitals {
            let table = read_vitals(path)?;
            info!(path = %path.display(), readings = table.rows.len(), "vitals_loaded");
            ctx.warnings.extend(table.warnings);
            ctx.inputs.vitals = table.rows;
        }
        Ok(())
    }
}
