//! Lexical resources that supply synonym candidates.

use crate::error::{PayloadError, PayloadResult};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Sense category a synonym lookup is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenseCategory {
    Noun,
    Verb,
    #[serde(alias = "adj")]
    Adjective,
}

impl SenseCategory {
    pub const ALL: [SenseCategory; 3] = [
        SenseCategory::Noun,
        SenseCategory::Verb,
        SenseCategory::Adjective,
    ];

    /// WordNet file suffix (`index.noun`, `data.adj`, ...).
    pub fn wordnet_suffix(&self) -> &'static str {
        match self {
            SenseCategory::Noun => "noun",
            SenseCategory::Verb => "verb",
            SenseCategory::Adjective => "adj",
        }
    }
}

/// Source of synonym candidates.
pub trait Lexicon: Send + Sync {
    /// Lemma names of every sense of `word` within `category`, in sense
    /// order. Multi-word lemmas use `_` as separator. Unknown words yield an
    /// empty list.
    fn lemmas(&self, word: &str, category: SenseCategory) -> Vec<String>;

    /// Whether `word` has at least one sense in `category`.
    fn knows(&self, word: &str, category: SenseCategory) -> bool {
        !self.lemmas(word, category).is_empty()
    }
}

/// Lexicon backed by a JSON document:
/// `{"noun": {"sky": ["sky", "heaven"]}, "verb": {...}, "adjective": {...}}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonLexicon {
    #[serde(default)]
    noun: HashMap<String, Vec<String>>,
    #[serde(default)]
    verb: HashMap<String, Vec<String>>,
    #[serde(default, alias = "adj")]
    adjective: HashMap<String, Vec<String>>,
}

impl JsonLexicon {
    pub fn from_json(text: &str) -> PayloadResult<Self> {
        serde_json::from_str(text)
            .map_err(|e| PayloadError::Configuration(format!("invalid lexicon document: {}", e)))
    }

    /// Load from a file. A missing file is a configuration error.
    pub fn load(path: &Path) -> PayloadResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            PayloadError::Configuration(format!(
                "lexicon {} unavailable: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&text)
    }

    /// Add an entry, mostly for tests.
    pub fn with_entry(
        mut self,
        category: SenseCategory,
        word: &str,
        lemmas: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.table_mut(category).insert(
            word.to_lowercase(),
            lemmas.into_iter().map(Into::into).collect(),
        );
        self
    }

    fn table(&self, category: SenseCategory) -> &HashMap<String, Vec<String>> {
        match category {
            SenseCategory::Noun => &self.noun,
            SenseCategory::Verb => &self.verb,
            SenseCategory::Adjective => &self.adjective,
        }
    }

    fn table_mut(&mut self, category: SenseCategory) -> &mut HashMap<String, Vec<String>> {
        match category {
            SenseCategory::Noun => &mut self.noun,
            SenseCategory::Verb => &mut self.verb,
            SenseCategory::Adjective => &mut self.adjective,
        }
    }
}

impl Lexicon for JsonLexicon {
    fn lemmas(&self, word: &str, category: SenseCategory) -> Vec<String> {
        self.table(category)
            .get(&word.to_lowercase())
            .cloned()
            .unwrap_or_default()
    }
}
