//! Store error types

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence failures
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport error talking to a remote store
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response from a remote store
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body, truncated
        message: String,
    },

    /// Referenced record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Whether retrying the operation may succeed: timeouts, connection
    /// failures, 5xx and 429 responses.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Http(e) => e.is_timeout() || e.is_connect(),
            StoreError::Api { status, .. } => *status >= 500 || *status == 429,
            StoreError::NotFound(_) | StoreError::Serialization(_) | StoreError::Backend(_) => {
                false
            }
        }
    }
}
