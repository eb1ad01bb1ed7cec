//! WordNet database reader.
//!
//! Reads the plain-text WordNet 3.x database (`index.<pos>`, `data.<pos>`
//! and the optional `<pos>.exc` exception lists) for nouns, verbs and
//! adjectives. Index entries point at byte offsets into the data files; the
//! data files are kept in memory and synset lines are parsed on lookup.

use super::lexicon::{Lexicon, SenseCategory};
use crate::error::{PayloadError, PayloadResult};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

const NOUN_RULES: &[(&str, &str)] = &[
    ("s", ""),
    ("ses", "s"),
    ("ves", "f"),
    ("xes", "x"),
    ("zes", "z"),
    ("ches", "ch"),
    ("shes", "sh"),
    ("men", "man"),
    ("ies", "y"),
];

const VERB_RULES: &[(&str, &str)] = &[
    ("s", ""),
    ("ies", "y"),
    ("es", "e"),
    ("es", ""),
    ("ed", "e"),
    ("ed", ""),
    ("ing", "e"),
    ("ing", ""),
];

const ADJ_RULES: &[(&str, &str)] = &[("er", ""), ("est", ""), ("er", "e"), ("est", "e")];

/// One part of speech of the database.
#[derive(Debug, Default)]
struct WordNetPart {
    index: HashMap<String, Vec<usize>>,
    data: String,
    exceptions: HashMap<String, Vec<String>>,
}

impl WordNetPart {
    fn load(dir: &Path, category: SenseCategory) -> PayloadResult<Self> {
        let suffix = category.wordnet_suffix();
        let index = read_required(&dir.join(format!("index.{}", suffix)))?;
        let data = read_required(&dir.join(format!("data.{}", suffix)))?;
        let exceptions = match std::fs::read_to_string(dir.join(format!("{}.exc", suffix))) {
            Ok(text) => parse_exceptions(&text),
            Err(_) => HashMap::new(),
        };
        Ok(Self::from_parts(&index, data, exceptions))
    }

    fn from_parts(index: &str, data: String, exceptions: HashMap<String, Vec<String>>) -> Self {
        Self {
            index: parse_index(index),
            data,
            exceptions,
        }
    }

    fn rules(category: SenseCategory) -> &'static [(&'static str, &'static str)] {
        match category {
            SenseCategory::Noun => NOUN_RULES,
            SenseCategory::Verb => VERB_RULES,
            SenseCategory::Adjective => ADJ_RULES,
        }
    }

    /// Base forms of `word` present in the index, the word itself first.
    fn base_forms(&self, word: &str, category: SenseCategory) -> Vec<String> {
        let mut forms = vec![word.to_string()];
        match self.exceptions.get(word) {
            Some(bases) => forms.extend(bases.iter().cloned()),
            None => {
                for (suffix, ending) in Self::rules(category) {
                    if let Some(stem) = word.strip_suffix(suffix) {
                        forms.push(format!("{}{}", stem, ending));
                    }
                }
            }
        }

        let mut seen = Vec::new();
        for form in forms {
            if self.index.contains_key(&form) && !seen.contains(&form) {
                seen.push(form);
            }
        }
        seen
    }

    fn synset_words(&self, offset: usize) -> Vec<String> {
        let Some(rest) = self.data.get(offset..) else {
            return Vec::new();
        };
        let line = rest.split('\n').next().unwrap_or_default();
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 4 || fields[0].parse::<usize>().ok() != Some(offset) {
            debug!(offset, "wordnet data offset does not start a synset line");
            return Vec::new();
        }
        let Ok(count) = usize::from_str_radix(fields[3], 16) else {
            return Vec::new();
        };
        fields
            .iter()
            .skip(4)
            .step_by(2)
            .take(count)
            .map(|word| strip_syntactic_marker(word).to_string())
            .collect()
    }
}

/// WordNet-backed [`Lexicon`].
#[derive(Debug)]
pub struct WordNetLexicon {
    parts: HashMap<SenseCategory, WordNetPart>,
}

impl WordNetLexicon {
    /// Open the database in `dir`. Missing index or data files are a
    /// configuration error.
    pub fn open(dir: &Path) -> PayloadResult<Self> {
        if !dir.is_dir() {
            return Err(PayloadError::Configuration(format!(
                "WordNet directory {} not found",
                dir.display()
            )));
        }
        let mut parts = HashMap::new();
        for category in SenseCategory::ALL {
            parts.insert(category, WordNetPart::load(dir, category)?);
        }
        debug!(dir = %dir.display(), "WordNet database loaded");
        Ok(Self { parts })
    }

    /// Build from in-memory file contents, keyed by category:
    /// `(index, data, exceptions)`.
    pub fn from_sources(
        sources: impl IntoIterator<Item = (SenseCategory, String, String, String)>,
    ) -> Self {
        let parts = sources
            .into_iter()
            .map(|(category, index, data, exc)| {
                (
                    category,
                    WordNetPart::from_parts(&index, data, parse_exceptions(&exc)),
                )
            })
            .collect();
        Self { parts }
    }
}

impl Lexicon for WordNetLexicon {
    fn lemmas(&self, word: &str, category: SenseCategory) -> Vec<String> {
        let Some(part) = self.parts.get(&category) else {
            return Vec::new();
        };
        let word = word.trim().to_lowercase().replace(' ', "_");
        let mut lemmas = Vec::new();
        for form in part.base_forms(&word, category) {
            for offset in part.index.get(&form).into_iter().flatten() {
                lemmas.extend(part.synset_words(*offset));
            }
        }
        lemmas
    }
}

fn read_required(path: &Path) -> PayloadResult<String> {
    std::fs::read_to_string(path).map_err(|e| {
        PayloadError::Configuration(format!("WordNet file {} unavailable: {}", path.display(), e))
    })
}

/// `lemma pos synset_cnt p_cnt [ptr...] sense_cnt tagsense_cnt offset...`;
/// the trailing `synset_cnt` fields are data-file offsets. License lines
/// start with a space.
fn parse_index(text: &str) -> HashMap<String, Vec<usize>> {
    let mut index = HashMap::new();
    for line in text.lines() {
        if line.starts_with(' ') || line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 4 {
            continue;
        }
        let Ok(synset_count) = fields[2].parse::<usize>() else {
            continue;
        };
        if synset_count > fields.len() {
            continue;
        }
        let offsets: Vec<usize> = fields[fields.len() - synset_count..]
            .iter()
            .filter_map(|f| f.parse().ok())
            .collect();
        index.insert(fields[0].to_string(), offsets);
    }
    index
}

/// `inflected base [base...]` per line.
fn parse_exceptions(text: &str) -> HashMap<String, Vec<String>> {
    text.lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let inflected = fields.next()?;
            let bases: Vec<String> = fields.map(str::to_string).collect();
            (!bases.is_empty()).then(|| (inflected.to_string(), bases))
        })
        .collect()
}

/// Adjective lemmas may carry a syntactic marker such as `(a)` or `(ip)`.
fn strip_syntactic_marker(word: &str) -> &str {
    match word.find('(') {
        Some(pos) if word.ends_with(')') => &word[..pos],
        _ => word,
    }
}
