use anyhow::Result;
use tracing::info;

use crate::ctx::Ctx;
use crate::io::{json_writer, tsv_writer, write_json};
use crate::pipeline::Stage;

pub struct Stage6Output;

impl Stage6Output {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage6Output {
    fn name(&self) -> &'static str {
        "stage6_output"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let report = json_writer::build_report(ctx)?;

        if ctx.write_json {
            write_json(&ctx.output.json_path, &report)?;
        }
        if ctx.write_tsv {
            tsv_writer::write_classifications(&ctx.output.classifications_path, &ctx.outcome)?;
            tsv_writer::write_zscores(&ctx.output.zscores_path, &ctx.outcome)?;
            tsv_writer::write_trends(&ctx.output.trends_path, &ctx.outcome)?;
        }
        ctx.report = Some(report);

        info!("stage6_output_ready");
        Ok(())
    }
}
