//! Synprobe shared data model.
//!
//! This crate holds the value types every other synprobe crate exchanges:
//! - [`SynonymTable`] and its derived [`Cardinalities`]
//! - [`ArrayKey`] and [`CoveringArray`], the combinatorial test set
//! - [`SeedRecord`], [`TestSentence`], [`TestQuery`], the persisted run data
//! - [`Verdict`] and [`OracleVerdict`], the scoring output

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod array;
mod error;
mod ids;
mod record;
mod synonym;
mod verdict;

pub use array::{ArrayKey, CoveringArray};
pub use error::{TypesError, TypesResult};
pub use ids::{OracleId, QueryId, SentenceId};
pub use record::{
    Label, ModelParameter, OracleDescription, QueryRecord, SeedRecord, SentenceRecord,
    TestQuery, TestSentence,
};
pub use synonym::{Cardinalities, SynonymTable};
pub use verdict::{OracleVerdict, Verdict};
