pub mod classify;
pub mod cycle_series;
pub mod derived;
pub mod outlier;
pub mod reference;
pub mod trend;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A cell as handed over by the ingestion side, before the quantity's rule
/// decides whether it is numeric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawValue {
    Number(f64),
    Text(String),
    Absent,
}

impl RawValue {
    /// Parses a spreadsheet-style cell: empty is absent, numbers are numbers,
    /// anything else is kept as text.
    pub fn parse(cell: &str) -> Self {
        let t = cell.trim();
        if t.is_empty() {
            return RawValue::Absent;
        }
        match t.parse::<f64>() {
            Ok(v) if v.is_finite() => RawValue::Number(v),
            _ => RawValue::Text(t.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            RawValue::Number(v) if v.is_finite() => Some(*v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortSample {
    pub site_id: String,
    pub quantity_id: String,
    pub cycle_id: String,
    pub value: RawValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToleranceBranch {
    Absolute,
    Relative,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRange {
    pub quantity_id: String,
    pub cycle_id: String,
    pub center: f64,
    pub lower_limit: f64,
    pub upper_limit: f64,
    pub sample_count: usize,
    pub excluded_count: usize,
    pub branch: ToleranceBranch,
}

impl ReferenceRange {
    pub fn contains(&self, value: f64) -> bool {
        self.lower_limit <= value && value <= self.upper_limit
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpretation {
    Acceptable,
    Unacceptable,
    NoSubmission,
}

impl Interpretation {
    pub fn label(&self) -> &'static str {
        match self {
            Interpretation::Acceptable => "Acceptable",
            Interpretation::Unacceptable => "Unacceptable",
            Interpretation::NoSubmission => "No submission",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub site_id: String,
    pub quantity_id: String,
    pub cycle_id: String,
    pub value: Option<f64>,
    pub interpretation: Interpretation,
    pub is_outlier: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleScore {
    Score(f64),
    NoSubmission,
}

impl CycleScore {
    pub fn value(&self) -> Option<f64> {
        match self {
            CycleScore::Score(z) => Some(*z),
            CycleScore::NoSubmission => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZScoreRecord {
    pub site_id: String,
    pub cycle_id: String,
    pub quantity_id: String,
    pub score: CycleScore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compliance {
    Compliant,
    Lapsed,
    NonCompliant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub site_id: String,
    pub acceptable_count: usize,
    pub warning_count: usize,
    pub unacceptable_count: usize,
    pub consecutive_no_submissions: usize,
}

impl PerformanceSummary {
    /// Two or more consecutive missed cycles is non-compliance.
    pub fn compliance(&self) -> Compliance {
        match self.consecutive_no_submissions {
            0 => Compliance::Compliant,
            1 => Compliance::Lapsed,
            _ => Compliance::NonCompliant,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteSeries {
    pub site_id: String,
    pub quantity_id: String,
    pub records: Vec<ZScoreRecord>,
    pub summary: PerformanceSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSample {
    pub patient_id: String,
    pub metric: String,
    pub timestamp: NaiveDateTime,
    pub value: f64,
    pub within_limits: bool,
    pub comment: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendPresence {
    Detected,
    Absent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Upwards,
    Downwards,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandLevel {
    Alarm,
    Caution,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartBand {
    pub level: BandLevel,
    pub lower: f64,
    pub upper: f64,
}

/// Chart-ready data for a detected trend: the windowed readings, a least
/// squares line over elapsed days and the metric's alarm bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendChart {
    pub points: Vec<ChartPoint>,
    pub fitted: Vec<ChartPoint>,
    pub slope_per_day: f64,
    pub sen_slope: f64,
    pub bands: Vec<ChartBand>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    pub patient_id: String,
    pub metric: String,
    pub trend: TrendPresence,
    pub direction: TrendDirection,
    pub p_value: Option<f64>,
    pub days_available: usize,
    pub chart: Option<TrendChart>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationEvent {
    pub patient_id: String,
    pub metric: String,
    pub comment: String,
    pub timestamp: NaiveDateTime,
}

/// A unit of work that could not be evaluated. The rest of the run goes on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitFailure {
    pub unit: String,
    pub message: String,
}
