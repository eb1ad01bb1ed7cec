//! Seed input and persisted run records.

use crate::error::{TypesError, TypesResult};
use crate::ids::{OracleId, QueryId, SentenceId};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Ground-truth label of a yes/no seed question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    True,
    False,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::True => "true",
            Label::False => "false",
        }
    }

    pub fn as_bool(&self) -> bool {
        matches!(self, Label::True)
    }
}

impl From<bool> for Label {
    fn from(value: bool) -> Self {
        if value {
            Label::True
        } else {
            Label::False
        }
    }
}

impl FromStr for Label {
    type Err = TypesError;

    fn from_str(s: &str) -> TypesResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(Label::True),
            "false" | "no" | "0" => Ok(Label::False),
            other => Err(TypesError::UnknownLabel(other.to_string())),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Label {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Label {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Bool(bool),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Bool(value) => Ok(value.into()),
            Raw::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// One line of the seed input: a question, its label and a supporting
/// passage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedRecord {
    pub question: String,
    pub answer: Label,
    #[serde(default)]
    pub passage: String,
}

/// A seed sentence as handed to persistence, created once per orchestrated
/// seed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSentence {
    pub sentence: String,
    /// Supporting passage shipped with the seed.
    #[serde(default)]
    pub original_response: String,
    pub correct_answer_label: Label,
    #[serde(default)]
    pub source_data_name: String,
    pub model_name: String,
    /// Canonical CSV of the covering array used for this sentence.
    pub ca_file: String,
    /// JSON of the synonym table.
    pub ipm_file: String,
    pub strength: usize,
    #[serde(default)]
    pub note: String,
}

/// A persisted test sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceRecord {
    pub id: SentenceId,
    #[serde(flatten)]
    pub sentence: TestSentence,
}

/// A decoded query together with the model's raw response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestQuery {
    /// Position of the query within its sentence; 0 is the baseline.
    pub ordinal: u32,
    /// The prompt as submitted, prefix and postfix included.
    pub modified_question: String,
    pub new_response: String,
}

/// A persisted test query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRecord {
    pub id: QueryId,
    pub sentence_id: SentenceId,
    #[serde(flatten)]
    pub query: TestQuery,
}

/// Key/value pair describing a model setting of a test run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelParameter {
    pub sentence_id: SentenceId,
    pub parameter: String,
    pub value: String,
}

/// Metadata of a scoring rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleDescription {
    pub id: OracleId,
    pub name: String,
    pub description: String,
}
