//! Synonym expansion.
//!
//! A seed sentence is split into whitespace-delimited tokens. Leading and
//! trailing punctuation is split off for lookup and re-attached to every
//! substituted candidate, so candidate 0 is always the raw token and the
//! baseline query reproduces the seed.

mod lexicon;
mod tagger;
mod wordnet;

pub use lexicon::{JsonLexicon, Lexicon, SenseCategory};
pub use tagger::{LexiconTagger, PartOfSpeech, PosTagger};
pub use wordnet::WordNetLexicon;

use crate::error::PayloadResult;
use std::collections::HashSet;
use std::sync::Arc;
use synprobe_types::SynonymTable;
use tracing::debug;

/// Default cap on candidates per position, original token included.
pub const DEFAULT_MAX_CANDIDATES: usize = 3;

/// A whitespace-delimited token with its punctuation affixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    raw: String,
    core_start: usize,
    core_end: usize,
}

impl Token {
    pub fn new(raw: &str) -> Self {
        let is_word = |c: char| c.is_alphanumeric();
        let core_start = raw.find(is_word).unwrap_or(raw.len());
        let core_end = raw
            .rfind(is_word)
            .map(|i| i + raw[i..].chars().next().map_or(1, char::len_utf8))
            .unwrap_or(core_start)
            .max(core_start);
        Self {
            raw: raw.to_string(),
            core_start,
            core_end,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The token without leading/trailing punctuation.
    pub fn core(&self) -> &str {
        &self.raw[self.core_start..self.core_end]
    }

    pub fn prefix(&self) -> &str {
        &self.raw[..self.core_start]
    }

    pub fn suffix(&self) -> &str {
        &self.raw[self.core_end..]
    }

    /// Substitute the core, keeping the affixes.
    pub fn with_core(&self, core: &str) -> String {
        format!("{}{}{}", self.prefix(), core, self.suffix())
    }
}

/// Split a sentence into tokens, preserving order.
pub fn tokenize(sentence: &str) -> Vec<Token> {
    sentence.split_whitespace().map(Token::new).collect()
}

/// Builds a [`SynonymTable`] for a seed sentence.
pub struct SynonymExpander {
    lexicon: Arc<dyn Lexicon>,
    tagger: Arc<dyn PosTagger>,
}

impl SynonymExpander {
    pub fn new(lexicon: Arc<dyn Lexicon>, tagger: Arc<dyn PosTagger>) -> Self {
        Self { lexicon, tagger }
    }

    /// Expander using a [`LexiconTagger`] over the same lexicon.
    pub fn with_lexicon(lexicon: Arc<dyn Lexicon>) -> Self {
        let tagger = Arc::new(LexiconTagger::new(lexicon.clone()));
        Self { lexicon, tagger }
    }

    /// Candidate lists per token. Each list starts with the raw token, holds
    /// no two entries equal after case folding and has at most
    /// `max_candidates` entries (at least one).
    pub fn expand(&self, sentence: &str, max_candidates: usize) -> PayloadResult<SynonymTable> {
        let tokens = tokenize(sentence);
        let tags = self.tagger.tag(&tokens);
        let positions = tokens
            .iter()
            .zip(tags)
            .map(|(token, tag)| self.candidates(token, tag, max_candidates.max(1)))
            .collect();
        let table = SynonymTable::new(positions)?;
        debug!(
            sentence,
            cardinalities = %table.cardinalities(),
            "synonym table built"
        );
        Ok(table)
    }

    fn candidates(&self, token: &Token, tag: PartOfSpeech, max: usize) -> Vec<String> {
        let mut list = vec![token.raw().to_string()];
        let mut seen: HashSet<String> = HashSet::from([token.raw().to_lowercase()]);
        let Some(category) = tag.sense_category() else {
            return list;
        };
        for lemma in self.lexicon.lemmas(token.core(), category) {
            if list.len() >= max {
                break;
            }
            let candidate = token.with_core(&lemma.to_lowercase());
            if seen.insert(candidate.to_lowercase()) {
                list.push(candidate);
            }
        }
        list
    }
}
