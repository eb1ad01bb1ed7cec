use synprobe_types::TypesError;
use thiserror::Error;

/// Result type for payload operations.
pub type PayloadResult<T> = Result<T, PayloadError>;

/// Payload pipeline errors.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// Missing or invalid generator backend or lexical resource. Fatal at
    /// startup.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A generator backend failed or produced unusable output. Nothing is
    /// cached for the request.
    #[error("covering array generation failed for {key}: {reason}")]
    Generation { key: String, reason: String },

    /// A row index does not exist in the synonym table it is decoded
    /// against; the cached array is stale or corrupt.
    #[error(
        "row {row}, position {position}: index {index} out of range for {cardinality} candidates"
    )]
    DecodeIntegrity {
        row: usize,
        position: usize,
        index: usize,
        cardinality: usize,
    },

    #[error("row {row} has {found} columns, synonym table has {expected} positions")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("invalid data: {0}")]
    Data(#[from] TypesError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PayloadError {
    pub(crate) fn generation(key: impl ToString, reason: impl Into<String>) -> Self {
        PayloadError::Generation {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}
