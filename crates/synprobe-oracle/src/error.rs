use synprobe_store::StoreError;
use synprobe_types::OracleId;
use thiserror::Error;

pub type OracleResult<T> = Result<T, OracleError>;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("unknown oracle {0}")]
    UnknownOracle(OracleId),
}
