use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::scores::{
    ClassificationResult, Compliance, EscalationEvent, PerformanceSummary, ReferenceRange,
    TrendResult, UnitFailure, ZScoreRecord,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMeta {
    pub issuer: String,
    pub today: NaiveDate,
    pub selected_cycle: Option<String>,
    pub program: Option<String>,
    pub rules_version: String,
    pub rules_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputCounts {
    pub cohort_rows: usize,
    pub history_tables: usize,
    pub vital_readings: usize,
}

/// Classification tallies for one quantity and cycle, next to its range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantityBlock {
    pub range: ReferenceRange,
    pub display_name: String,
    pub units: String,
    pub alp_note: String,
    pub acceptable: usize,
    pub unacceptable: usize,
    pub no_submission: usize,
    pub outliers: usize,
    pub results: Vec<ClassificationResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteSeriesEntry {
    pub site_id: String,
    pub quantity_id: String,
    pub compliance: Compliance,
    pub summary: PerformanceSummary,
    pub records: Vec<ZScoreRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerQcV1 {
    pub tool: String,
    pub version: String,
    pub schema_version: String,
    pub run: RunMeta,
    pub inputs: InputCounts,
    pub quantities: Vec<QuantityBlock>,
    pub site_series: Vec<SiteSeriesEntry>,
    pub trends: Vec<TrendResult>,
    pub escalations: Vec<EscalationEvent>,
    pub failures: Vec<UnitFailure>,
    pub warnings: Vec<String>,
}
