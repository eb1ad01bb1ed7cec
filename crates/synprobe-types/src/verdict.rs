//! Oracle verdicts.

use crate::ids::{OracleId, QueryId};
use crate::record::Label;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a single model response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    True,
    False,
    Undefined,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::True => "true",
            Verdict::False => "false",
            Verdict::Undefined => "undefined",
        }
    }

    /// Whether the verdict agrees with a ground-truth label.
    pub fn matches(&self, label: Label) -> bool {
        matches!(
            (self, label),
            (Verdict::True, Label::True) | (Verdict::False, Label::False)
        )
    }
}

impl From<Label> for Verdict {
    fn from(label: Label) -> Self {
        match label {
            Label::True => Verdict::True,
            Label::False => Verdict::False,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict of one oracle on one query. At most one exists per
/// `(query_id, oracle_id)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleVerdict {
    pub oracle_id: OracleId,
    pub query_id: QueryId,
    pub verdict: Verdict,
}

impl OracleVerdict {
    pub fn key(&self) -> (QueryId, OracleId) {
        (self.query_id, self.oracle_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_never_matches_a_label() {
        assert!(!Verdict::Undefined.matches(Label::True));
        assert!(!Verdict::Undefined.matches(Label::False));
        assert!(Verdict::False.matches(Label::False));
    }

    #[test]
    fn verdict_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Verdict::Undefined).unwrap(),
            "\"undefined\""
        );
    }
}
