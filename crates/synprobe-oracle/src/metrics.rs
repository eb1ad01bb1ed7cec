//! Aggregate scores over classified queries.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use synprobe_types::{Label, QueryId, SentenceId, Verdict};

/// A classified query with the label of its sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoredQuery {
    pub sentence_id: SentenceId,
    pub query_id: QueryId,
    pub label: Label,
    pub verdict: Verdict,
}

/// Counts of verdicts against labels. `true` is the positive class;
/// undefined verdicts are not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_positives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,
}

impl ConfusionMatrix {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Label, Verdict)>) -> Self {
        let mut matrix = Self::default();
        for (label, verdict) in pairs {
            matrix.record(label, verdict);
        }
        matrix
    }

    pub fn record(&mut self, label: Label, verdict: Verdict) {
        match (label, verdict) {
            (Label::True, Verdict::True) => self.true_positives += 1,
            (Label::False, Verdict::True) => self.false_positives += 1,
            (Label::False, Verdict::False) => self.true_negatives += 1,
            (Label::True, Verdict::False) => self.false_negatives += 1,
            (_, Verdict::Undefined) => {}
        }
    }

    /// TP / (TP + FP), 0 without positive verdicts.
    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    /// TP / (TP + FN), 0 without positive labels.
    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    /// Harmonic mean of precision and recall, 0 when both are 0.
    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Share of a sentence's queries whose verdict equals the verdict of its
/// baseline (the query with the smallest identifier). `None` for an empty
/// group.
pub fn group_consistency(group: &[(QueryId, Verdict)]) -> Option<f64> {
    let (_, baseline) = group.iter().min_by_key(|(id, _)| *id)?;
    let agreeing = group.iter().filter(|(_, v)| v == baseline).count();
    Some(agreeing as f64 / group.len() as f64)
}

/// Mean [`group_consistency`] over sentences. 0 when there are no queries.
pub fn consistency(queries: &[ScoredQuery]) -> f64 {
    let mut groups: BTreeMap<SentenceId, Vec<(QueryId, Verdict)>> = BTreeMap::new();
    for q in queries {
        groups
            .entry(q.sentence_id)
            .or_default()
            .push((q.query_id, q.verdict));
    }
    let scores: Vec<f64> = groups.values().filter_map(|g| group_consistency(g)).collect();
    if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}
