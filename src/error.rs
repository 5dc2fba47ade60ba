use thiserror::Error;

/// Failures raised by the evaluation engine. Each one is scoped to a single
/// unit of work (quantity, site, patient-metric) unless stated otherwise.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("unknown quantity '{0}'")]
    UnknownQuantity(String),

    #[error("no numeric submissions for quantity '{quantity_id}' in cycle '{cycle_id}'")]
    EmptyCohort {
        quantity_id: String,
        cycle_id: String,
    },

    /// Caller-side selection mistake; aborts the cycle-series pass.
    #[error("selected cycle '{0}' is not in the historical cycle list")]
    UnknownCycle(String),

    #[error("site '{site_id}' has {got} historical values, expected {expected}")]
    HistoryShape {
        site_id: String,
        got: usize,
        expected: usize,
    },

    #[error("invalid rule '{id}': {reason}")]
    InvalidRule { id: String, reason: String },

    #[error("evaluation aborted: {0}")]
    Aborted(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
