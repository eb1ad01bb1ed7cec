//! Scoring rules.

use crate::classify::classify;
use std::collections::BTreeMap;
use std::sync::Arc;
use synprobe_types::{OracleDescription, OracleId, Verdict};

/// Identifier of [`FirstTokenOracle`].
pub const DEFAULT_ORACLE_ID: OracleId = OracleId(1);

/// A scoring rule mapping a model response to a [`Verdict`].
pub trait Oracle: Send + Sync {
    fn id(&self) -> OracleId;

    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Classify `response`, given the question it answers.
    fn classify(&self, response: &str, question: &str) -> Verdict;

    fn describe(&self) -> OracleDescription {
        OracleDescription {
            id: self.id(),
            name: self.name().to_string(),
            description: self.description().to_string(),
        }
    }
}

/// Takes the first token left after stripping the response marker, the
/// echoed question and punctuation: yes/true/1 is `true`, no/false/0 is
/// `false`, anything else is `undefined`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstTokenOracle;

impl Oracle for FirstTokenOracle {
    fn id(&self) -> OracleId {
        DEFAULT_ORACLE_ID
    }

    fn name(&self) -> &str {
        "first-token"
    }

    fn description(&self) -> &str {
        "First token of the normalized response: yes/true/1 is true, no/false/0 is false, otherwise undefined"
    }

    fn classify(&self, response: &str, question: &str) -> Verdict {
        classify(response, question)
    }
}

/// Oracles by identifier.
#[derive(Clone, Default)]
pub struct OracleRegistry {
    oracles: BTreeMap<OracleId, Arc<dyn Oracle>>,
}

impl OracleRegistry {
    /// Registry holding the built-in oracles.
    pub fn with_defaults() -> Self {
        let mut registry = Self::default();
        registry.register(Arc::new(FirstTokenOracle));
        registry
    }

    /// Add an oracle, replacing one with the same identifier.
    pub fn register(&mut self, oracle: Arc<dyn Oracle>) {
        self.oracles.insert(oracle.id(), oracle);
    }

    pub fn get(&self, id: OracleId) -> Option<Arc<dyn Oracle>> {
        self.oracles.get(&id).cloned()
    }

    pub fn ids(&self) -> impl Iterator<Item = OracleId> + '_ {
        self.oracles.keys().copied()
    }
}
