//! First-token response classification.
//!
//! The marker is stripped before the echoed question. When the two overlap
//! the order decides what remains; this is kept as is.

use synprobe_types::Verdict;

/// Prefix some model services put in front of every answer.
pub const RESPONSE_MARKER: &str = "Result is: ";

/// Padding token emitted by seq2seq models.
const PAD_TOKEN: &str = "<pad>";

/// Remove the response marker, then any echoed copy of the question.
pub fn reduce_response(response: &str, question: &str) -> String {
    let reduced = response.replace(RESPONSE_MARKER, "");
    if question.is_empty() {
        reduced
    } else {
        reduced.replace(question, "")
    }
}

/// Drop padding tokens and everything but ASCII letters, digits and
/// spaces, lowercase, then split on whitespace.
pub fn normalize(text: &str) -> Vec<String> {
    text.replace(PAD_TOKEN, "")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Classify a response by its first remaining token.
pub fn classify(response: &str, question: &str) -> Verdict {
    let tokens = normalize(&reduce_response(response, question));
    let Some(first) = tokens.first() else {
        return Verdict::Undefined;
    };
    let negative = matches!(first.as_str(), "no" | "false" | "0");
    let positive = matches!(first.as_str(), "yes" | "true" | "1");
    match (negative, positive) {
        (true, false) => Verdict::False,
        (false, true) => Verdict::True,
        _ => Verdict::Undefined,
    }
}
