//! Store-assigned identifiers.
//!
//! Identifiers are assigned in insertion order by the persistence layer, so
//! the smallest [`QueryId`] of a sentence is its baseline query.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! store_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

store_id!(
    /// Identifier of a persisted test sentence (one per orchestrated seed).
    SentenceId
);
store_id!(
    /// Identifier of a persisted test query.
    QueryId
);
store_id!(
    /// Identifier of a scoring rule.
    OracleId
);
