use anyhow::Result;
use chrono::Local;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use kira_peerqc::cli::{Cli, Commands, RulesCommand, RulesShowArgs, RunArgs};
use kira_peerqc::ctx::{Ctx, EvalRequest, InputPaths};
use kira_peerqc::io;
use kira_peerqc::pipeline::Pipeline;
use kira_peerqc::rules::{self, CenterStatistic, ThresholdMode};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => handle_run(args)?,
        Commands::Rules(args) => match args.command {
            RulesCommand::Show(show) => handle_rules_show(show)?,
        },
    }

    Ok(())
}

fn handle_run(args: RunArgs) -> Result<()> {
    let request = EvalRequest {
        program: args.program,
        selected_cycle: args.selected_cycle,
        issuer: args.issuer,
        today: args.today.unwrap_or_else(|| Local::now().date_naive()),
    };
    let paths = InputPaths {
        cohort: args.cohort,
        history: args.history,
        vitals: args.vitals,
        rules: args.rules,
    };
    let mut ctx = Ctx::new(request, paths, args.out, args.json, args.tsv);
    ctx.background = args.background;

    let pipeline = if ctx.background {
        Pipeline::background()
    } else {
        Pipeline::standard()
    };
    pipeline.run(&mut ctx)?;

    print_summary(&ctx);
    Ok(())
}

fn print_summary(ctx: &Ctx) {
    print!("{}", io::summary::format_summary(ctx));
    let warnings: Vec<&String> = ctx
        .warnings
        .iter()
        .chain(ctx.outcome.warnings.iter())
        .collect();
    if !warnings.is_empty() {
        println!("warnings:");
        for warning in warnings {
            println!("- {}", warning);
        }
    }
    if !ctx.outcome.failures.is_empty() {
        println!("failures:");
        for failure in &ctx.outcome.failures {
            println!("- {}: {}", failure.unit, failure.message);
        }
    }
}

fn handle_rules_show(args: RulesShowArgs) -> Result<()> {
    let table = rules::load_with_overlay(args.rules.as_deref())?;
    println!("rules (version {}):", table.version);
    for rule in table.rules() {
        if let Some(program) = &args.program {
            if !rule.program().eq_ignore_ascii_case(program) {
                continue;
            }
        }
        let center = match rule.center {
            CenterStatistic::Median => "median",
            CenterStatistic::Mean => "mean",
        };
        let mode = match rule.threshold_mode {
            ThresholdMode::Above => ">",
            ThresholdMode::AtOrAbove => ">=",
        };
        let derived = rule
            .derived
            .as_ref()
            .map(|d| format!("\t= {}", d))
            .unwrap_or_default();
        println!(
            "{}\t{}\t{}\t{}{}\t±{}\t±{}%\t{}dp{}",
            rule.id,
            rule.display_name,
            center,
            mode,
            rule.threshold,
            rule.below_delta,
            rule.above_fraction * 100.0,
            rule.precision,
            derived
        );
    }
    Ok(())
}
