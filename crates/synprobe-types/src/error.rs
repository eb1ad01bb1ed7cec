use thiserror::Error;

/// Result type for model construction.
pub type TypesResult<T> = Result<T, TypesError>;

/// Errors raised when a value would violate a data-model invariant.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("synonym table position {0} has no candidates")]
    EmptyPosition(usize),

    #[error("covering array row {row} has {found} columns, expected {expected}")]
    ColumnMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("covering array row {row}: unparseable value {value:?}")]
    InvalidValue { row: usize, value: String },

    #[error("strength must be at least 1")]
    ZeroStrength,

    #[error("unknown label: {0}")]
    UnknownLabel(String),
}
