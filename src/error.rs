//! Error taxonomy for the lifecycle engine.
//!
//! Scoring and ranking are total functions and never fail. Errors only come from
//! configuration, storage, or an interactive confirmation that was declined.
//! "Insufficient data" is deliberately not here: it is a [`Warning`] carried in
//! reports, because it triggers fallbacks instead of aborting.

use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Required external configuration (e.g. the site URL) is absent.
    #[error("missing configuration: {0}")]
    MissingConfiguration(String),

    /// The operator declined the confirmation prompt for a live run.
    #[error("cancelled by user")]
    CancelledByUser,

    #[error("entity not found: {0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl EngineError {
    /// Process exit code for the CLI: every engine error aborts with `1`.
    pub fn exit_code(&self) -> u8 {
        1
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Non-fatal conditions surfaced alongside a result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// No signal rows matched an entity; the fallback formula was used.
    NoSignalData { entity_id: String },
    /// A selection cascade exhausted every stage without reaching `wanted`.
    InsufficientCandidates { wanted: usize, found: usize },
    /// Nothing was old enough to evaluate.
    NothingToEvaluate { skipped_too_young: usize },
}
