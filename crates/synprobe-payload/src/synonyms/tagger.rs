//! Grammatical role classification of tokens.

use super::lexicon::{Lexicon, SenseCategory};
use super::Token;
use std::sync::Arc;

/// Grammatical role of a token. Only proper nouns, nouns, verbs and
/// adjectives are expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartOfSpeech {
    ProperNoun,
    Noun,
    Verb,
    Adjective,
    Other,
}

impl PartOfSpeech {
    /// Sense category to restrict synonym lookup to, if eligible.
    pub fn sense_category(&self) -> Option<SenseCategory> {
        match self {
            PartOfSpeech::ProperNoun | PartOfSpeech::Noun => Some(SenseCategory::Noun),
            PartOfSpeech::Verb => Some(SenseCategory::Verb),
            PartOfSpeech::Adjective => Some(SenseCategory::Adjective),
            PartOfSpeech::Other => None,
        }
    }
}

/// Assigns a [`PartOfSpeech`] to every token of a sentence.
pub trait PosTagger: Send + Sync {
    /// One tag per token, in token order.
    fn tag(&self, tokens: &[Token]) -> Vec<PartOfSpeech>;
}

/// Function words that are never expanded.
const CLOSED_CLASS: &[&str] = &[
    "a", "about", "above", "after", "against", "all", "am", "an", "and", "any", "are", "as", "at",
    "be", "been", "before", "being", "below", "between", "both", "but", "by", "can", "could",
    "did", "do", "does", "doing", "down", "during", "each", "either", "every", "few", "for",
    "from", "had", "has", "have", "having", "he", "her", "hers", "him", "his", "how", "i", "if",
    "in", "into", "is", "it", "its", "may", "me", "might", "more", "most", "must", "my",
    "neither", "no", "nor", "not", "of", "off", "on", "once", "only", "or", "other", "our",
    "ours", "out", "over", "shall", "she", "should", "so", "some", "such", "than", "that", "the",
    "their", "them", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "us", "was", "we", "were", "what", "when", "where", "whether",
    "which", "while", "who", "whom", "whose", "why", "will", "with", "would", "yes", "you",
    "your",
];

/// Tagger driven by a [`Lexicon`]: closed-class words are ineligible, a
/// capitalised word past the first position is a proper noun, anything else
/// takes the first sense category (noun, verb, adjective) the lexicon knows
/// it in.
pub struct LexiconTagger {
    lexicon: Arc<dyn Lexicon>,
}

impl LexiconTagger {
    pub fn new(lexicon: Arc<dyn Lexicon>) -> Self {
        Self { lexicon }
    }

    fn tag_one(&self, position: usize, token: &Token) -> PartOfSpeech {
        let core = token.core();
        if core.is_empty() || !core.chars().any(char::is_alphabetic) {
            return PartOfSpeech::Other;
        }
        let lower = core.to_lowercase();
        if CLOSED_CLASS.contains(&lower.as_str()) {
            return PartOfSpeech::Other;
        }
        if position > 0 && core.chars().next().is_some_and(char::is_uppercase) {
            return PartOfSpeech::ProperNoun;
        }
        SenseCategory::ALL
            .into_iter()
            .find(|category| self.lexicon.knows(&lower, *category))
            .map(|category| match category {
                SenseCategory::Noun => PartOfSpeech::Noun,
                SenseCategory::Verb => PartOfSpeech::Verb,
                SenseCategory::Adjective => PartOfSpeech::Adjective,
            })
            .unwrap_or(PartOfSpeech::Other)
    }
}

impl PosTagger for LexiconTagger {
    fn tag(&self, tokens: &[Token]) -> Vec<PartOfSpeech> {
        tokens
            .iter()
            .enumerate()
            .map(|(position, token)| self.tag_one(position, token))
            .collect()
    }
}
