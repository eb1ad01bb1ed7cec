//! Synprobe oracle engine.
//!
//! Classifies model responses into [`Verdict`]s, persists them per
//! `(query, oracle)` and computes the aggregate scores of a run: verdict
//! histogram, confusion matrix, precision, recall, F1 and response
//! consistency against each sentence's baseline query.
//!
//! [`Verdict`]: synprobe_types::Verdict

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod classify;
mod error;
mod metrics;
mod oracle;
mod service;

pub use classify::{classify, normalize, reduce_response, RESPONSE_MARKER};
pub use error::{OracleError, OracleResult};
pub use metrics::{consistency, group_consistency, ConfusionMatrix, ScoredQuery};
pub use oracle::{FirstTokenOracle, Oracle, OracleRegistry, DEFAULT_ORACLE_ID};
pub use service::{EvaluationReport, EvaluationSummary, OracleService, SentenceFilter};
