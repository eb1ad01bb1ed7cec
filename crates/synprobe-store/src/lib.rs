//! Synprobe result persistence.
//!
//! The pipeline persists test sentences, test queries, model parameters and
//! oracle verdicts through the [`ResultStore`] traits. Two stores are
//! provided:
//! - [`InMemoryStore`] for development, tests and one-shot runs
//! - [`HttpStore`], a client for the result-store service
//!
//! [`RetryingStore`] wraps either one with a bounded retry for transient
//! failures; query and verdict writes are idempotent upserts, so retrying a
//! write whose response was lost does not duplicate data.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod error;
mod http;
mod memory;
mod retry;
mod traits;

pub use error::{StoreError, StoreResult};
pub use http::HttpStore;
pub use memory::InMemoryStore;
pub use retry::{RetryPolicy, RetryingStore};
pub use traits::{
    OracleDescriptionStore, ParameterStore, QueryStore, ResultStore, SentenceStore, VerdictStore,
};
