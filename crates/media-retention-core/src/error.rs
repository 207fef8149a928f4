//! Error types for the retention engine

use media_retention_sources::SourceError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Referenced media id or job id is not known
    #[error("Not found: {0}")]
    NotFound(String),

    /// `start()` called on an engine that is already running
    #[error("Sync engine is already running")]
    AlreadyRunning,

    /// Another reconciliation holds the run guard
    #[error("A reconciliation is already in progress")]
    ReconciliationInProgress,

    /// Retention string is not `<n><d|h|m|s>` or `never`
    #[error("Invalid duration '{0}': expected <number><d|h|m|s> or 'never'")]
    InvalidDuration(String),

    /// A collaborator call failed
    #[error("Source {source_name} unavailable: {message}")]
    SourceUnavailable { source_name: String, message: String },

    /// Exclusion store or job ledger write failed
    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),
}

impl From<SourceError> for EngineError {
    fn from(e: SourceError) -> Self {
        EngineError::SourceUnavailable {
            source_name: e.source_name().to_string(),
            message: e.message().to_string(),
        }
    }
}
