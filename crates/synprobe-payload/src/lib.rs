//! Synprobe payload pipeline.
//!
//! Turns one seed sentence into the set of rephrased queries submitted to a
//! model under test:
//! - [`synonyms`]: per-token candidate substitutions ([`SynonymExpander`])
//! - [`generator`]: covering arrays from pluggable generator backends, cached
//!   per `(cardinalities, strength)` ([`ArrayGenerator`])
//! - [`codec`]: covering-array rows back into natural-language queries

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod codec;
mod error;
pub mod generator;
pub mod synonyms;

pub use codec::{baseline_row, decode, decode_row, Decoder};
pub use error::{PayloadError, PayloadResult};
pub use generator::{
    ArrayCache, ArrayGenerator, ArrayHandle, CoveringArrayGenerator, GeneratorKind, RowReader,
};
pub use synonyms::{
    JsonLexicon, Lexicon, LexiconTagger, PartOfSpeech, PosTagger, SenseCategory, SynonymExpander,
    Token, WordNetLexicon, DEFAULT_MAX_CANDIDATES,
};
