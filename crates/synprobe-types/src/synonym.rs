//! Synonym tables and their cardinality view.

use crate::error::{TypesError, TypesResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-token candidate substitutions for one seed sentence.
///
/// Position order matches token order in the seed sentence. Candidate 0 of
/// every position is the original token. The table is immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<String>>", into = "Vec<Vec<String>>")]
pub struct SynonymTable {
    positions: Vec<Vec<String>>,
}

impl SynonymTable {
    /// Build a table, rejecting positions without any candidate.
    pub fn new(positions: Vec<Vec<String>>) -> TypesResult<Self> {
        if let Some(empty) = positions.iter().position(Vec::is_empty) {
            return Err(TypesError::EmptyPosition(empty));
        }
        Ok(Self { positions })
    }

    /// Number of positions (tokens).
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Candidates at a position, original token first.
    pub fn candidates(&self, position: usize) -> Option<&[String]> {
        self.positions.get(position).map(Vec::as_slice)
    }

    /// Candidate `index` at `position`.
    pub fn candidate(&self, position: usize, index: usize) -> Option<&str> {
        self.positions
            .get(position)
            .and_then(|c| c.get(index))
            .map(String::as_str)
    }

    /// Iterate positions in token order.
    pub fn positions(&self) -> impl Iterator<Item = &[String]> {
        self.positions.iter().map(Vec::as_slice)
    }

    /// The original tokens, one per position.
    pub fn originals(&self) -> impl Iterator<Item = &str> {
        self.positions.iter().map(|c| c[0].as_str())
    }

    /// Candidate count per position.
    pub fn cardinalities(&self) -> Cardinalities {
        Cardinalities(self.positions.iter().map(Vec::len).collect())
    }

    /// JSON serialization stored alongside a test sentence.
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.positions).unwrap_or_else(|_| "[]".to_string())
    }
}

impl TryFrom<Vec<Vec<String>>> for SynonymTable {
    type Error = TypesError;

    fn try_from(positions: Vec<Vec<String>>) -> TypesResult<Self> {
        Self::new(positions)
    }
}

impl From<SynonymTable> for Vec<Vec<String>> {
    fn from(table: SynonymTable) -> Self {
        table.positions
    }
}

/// Candidate count per position of a [`SynonymTable`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cardinalities(pub Vec<usize>);

impl Cardinalities {
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Cardinalities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(usize::to_string)
            .collect::<Vec<_>>()
            .join(",");
        f.write_str(&joined)
    }
}

impl From<Vec<usize>> for Cardinalities {
    fn from(values: Vec<usize>) -> Self {
        Self(values)
    }
}
