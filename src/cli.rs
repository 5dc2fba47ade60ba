use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "kira-peerqc",
    version,
    about = "Peer-group QA evaluation: reference ranges, site classification, z-scores and vital-sign trends"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    Run(RunArgs),
    Rules(RulesArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[arg(long, help = "Cohort TSV: site_id, quantity_id, cycle_id, value")]
    pub cohort: Option<PathBuf>,

    #[arg(long, help = "Historical TSV: site_id, quantity_id, then one column per cycle")]
    pub history: Option<PathBuf>,

    #[arg(long, help = "Vital-sign TSV: patient_id, metric, timestamp, value, within_limits, comment")]
    pub vitals: Option<PathBuf>,

    #[arg(long, help = "Cycle to evaluate (defaults to every cohort cycle and the last history cycle)")]
    pub selected_cycle: Option<String>,

    #[arg(long, help = "Only evaluate quantities of this program (e.g. epoc, istat)")]
    pub program: Option<String>,

    #[arg(long, help = "Day used for escalations, YYYY-MM-DD (defaults to the local date)")]
    pub today: Option<NaiveDate>,

    #[arg(long, help = "Optional rules TSV to overlay on the built-in table")]
    pub rules: Option<PathBuf>,

    #[arg(long, default_value = ".")]
    pub out: PathBuf,

    #[arg(long, default_value_t = false)]
    pub json: bool,

    #[arg(long, default_value_t = false)]
    pub tsv: bool,

    #[arg(long, default_value = "")]
    pub issuer: String,

    #[arg(long, default_value_t = false, help = "Evaluate on a background worker")]
    pub background: bool,
}

#[derive(Debug, Args)]
pub struct RulesArgs {
    #[command(subcommand)]
    pub command: RulesCommand,
}

#[derive(Debug, Subcommand)]
pub enum RulesCommand {
    Show(RulesShowArgs),
}

#[derive(Debug, Args)]
pub struct RulesShowArgs {
    #[arg(long, help = "Optional rules TSV to overlay on the built-in table")]
    pub rules: Option<PathBuf>,

    #[arg(long, help = "Only list rules of this program")]
    pub program: Option<String>,
}
