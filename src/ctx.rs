use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::engine::{EvalInputs, EvaluationOutcome};
use crate::rules::RuleTable;
use crate::schema::v1::PeerQcV1;

/// Immutable description of one evaluation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalRequest {
    /// Restricts evaluation to quantities whose id starts with `<program>.`.
    pub program: Option<String>,
    pub selected_cycle: Option<String>,
    pub issuer: String,
    /// Day used for escalations.
    pub today: NaiveDate,
}

impl EvalRequest {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            program: None,
            selected_cycle: None,
            issuer: String::new(),
            today,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InputPaths {
    pub cohort: Option<PathBuf>,
    pub history: Option<PathBuf>,
    pub vitals: Option<PathBuf>,
    pub rules: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub out_dir: PathBuf,
    pub json_path: PathBuf,
    pub classifications_path: PathBuf,
    pub zscores_path: PathBuf,
    pub trends_path: PathBuf,
}

impl OutputPaths {
    pub fn new(out_dir: PathBuf) -> Self {
        Self {
            json_path: out_dir.join("peerqc.json"),
            classifications_path: out_dir.join("classifications.tsv"),
            zscores_path: out_dir.join("zscores.tsv"),
            trends_path: out_dir.join("trends.tsv"),
            out_dir,
        }
    }
}

#[derive(Debug)]
pub struct Ctx {
    pub request: EvalRequest,
    pub inputs_paths: InputPaths,
    pub write_json: bool,
    pub write_tsv: bool,
    pub background: bool,
    pub rules: Option<RuleTable>,
    pub inputs: EvalInputs,
    pub outcome: EvaluationOutcome,
    pub warnings: Vec<String>,
    pub output: OutputPaths,
    pub report: Option<PeerQcV1>,
}

impl Ctx {
    pub fn new(
        request: EvalRequest,
        inputs_paths: InputPaths,
        out_dir: PathBuf,
        write_json: bool,
        write_tsv: bool,
    ) -> Self {
        Self {
            request,
            inputs_paths,
            write_json,
            write_tsv,
            background: false,
            rules: None,
            inputs: EvalInputs::default(),
            outcome: EvaluationOutcome::default(),
            warnings: Vec::new(),
            output: OutputPaths::new(out_dir),
            report: None,
        }
    }

    pub fn rules(&self) -> anyhow::Result<&RuleTable> {
        self.rules
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("rule table not loaded"))
    }
}
