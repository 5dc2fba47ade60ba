use anyhow::Result;
use tracing::info;

use crate::ctx::Ctx;
use crate::pipeline::Stage;
use crate::rules::load_with_overlay;

pub struct Stage1Rules;

impl Stage1Rules {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage1Rules {
    fn name(&self) -> &'static str {
        "stage1_rules"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let table = load_with_overlay(ctx.inputs_paths.rules.as_deref())?;
        if let Some(program) = &ctx.request.program {
            let known = table
                .programs()
                .iter()
                .any(|p| p.eq_ignore_ascii_case(program));
            if !known {
                ctx.warnings
                    .push(format!("program '{}' has no rules in the table", program));
            }
        }
        info!(
            version = %table.version,
            rules = table.len(),
            "rules_loaded"
        );
        ctx.rules = Some(table);
        Ok(())
    }
}
