//! Runner error types

use synprobe_oracle::OracleError;
use synprobe_payload::PayloadError;
use synprobe_store::StoreError;
use thiserror::Error;

/// Result type for runner operations
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Errors that stop a run
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error("Persistence error: {0}")]
    Store(#[from] StoreError),

    #[error("Evaluation error: {0}")]
    Oracle(#[from] OracleError),

    /// Malformed seed input
    #[error("Seed line {line}: {reason}")]
    Seed { line: usize, reason: String },

    /// A fatal error while processing one seed sentence
    #[error("Sentence {sentence:?} failed: {source}")]
    Sentence {
        sentence: String,
        #[source]
        source: Box<RunnerError>,
    },

    #[error("Model service error: {0}")]
    Model(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<config::ConfigError> for RunnerError {
    fn from(e: config::ConfigError) -> Self {
        RunnerError::Config(e.to_string())
    }
}
