//! Evaluation over persisted run data.

use crate::error::OracleResult;
use crate::metrics::{consistency, ConfusionMatrix, ScoredQuery};
use crate::oracle::Oracle;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use synprobe_store::ResultStore;
use synprobe_types::{OracleId, OracleVerdict, QueryId, SentenceRecord, TestSentence, Verdict};
use tracing::{debug, info, instrument};

/// Restricts evaluation to sentences of one model, strength or note.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceFilter {
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub strength: Option<usize>,
    #[serde(default)]
    pub note: Option<String>,
}

impl SentenceFilter {
    pub fn matches(&self, sentence: &TestSentence) -> bool {
        self.model_name
            .as_deref()
            .map_or(true, |m| m == sentence.model_name)
            && self.strength.map_or(true, |s| s == sentence.strength)
            && self.note.as_deref().map_or(true, |n| n == sentence.note)
    }
}

/// Outcome of [`OracleService::evaluate`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EvaluationSummary {
    pub sentences: usize,
    /// Queries classified in this pass.
    pub classified: usize,
    /// Queries that already had a verdict from the oracle.
    pub already_scored: usize,
}

/// Scores of one oracle over the selected sentences.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub oracle_id: OracleId,
    pub sentences: usize,
    pub queries: usize,
    /// Queries without a verdict from the oracle; not part of any score.
    pub unscored: usize,
    pub histogram: BTreeMap<Verdict, usize>,
    pub confusion: ConfusionMatrix,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub consistency: f64,
}

/// Classifies stored queries and scores the results.
pub struct OracleService {
    store: Arc<dyn ResultStore>,
}

impl OracleService {
    pub fn new(store: Arc<dyn ResultStore>) -> Self {
        Self { store }
    }

    async fn selected_sentences(&self, filter: &SentenceFilter) -> OracleResult<Vec<SentenceRecord>> {
        Ok(self
            .store
            .load_sentences()
            .await?
            .into_iter()
            .filter(|record| filter.matches(&record.sentence))
            .collect())
    }

    /// Persist a verdict of `oracle` for every selected query that lacks
    /// one. Running it again classifies nothing new.
    #[instrument(skip(self, oracle), fields(oracle = oracle.name()))]
    pub async fn evaluate(
        &self,
        oracle: &dyn Oracle,
        filter: &SentenceFilter,
    ) -> OracleResult<EvaluationSummary> {
        self.store.upsert_oracle_description(oracle.describe()).await?;
        let scored: HashSet<QueryId> = self
            .store
            .load_verdicts(oracle.id())
            .await?
            .iter()
            .map(|v| v.query_id)
            .collect();

        let mut summary = EvaluationSummary::default();
        for record in self.selected_sentences(filter).await? {
            summary.sentences += 1;
            for query in self.store.load_queries(record.id).await? {
                if scored.contains(&query.id) {
                    summary.already_scored += 1;
                    continue;
                }
                let verdict = oracle.classify(&query.query.new_response, &query.query.modified_question);
                debug!(query_id = %query.id, %verdict, "query classified");
                self.store
                    .upsert_verdict(OracleVerdict {
                        oracle_id: oracle.id(),
                        query_id: query.id,
                        verdict,
                    })
                    .await?;
                summary.classified += 1;
            }
        }
        info!(
            sentences = summary.sentences,
            classified = summary.classified,
            already_scored = summary.already_scored,
            "evaluation finished"
        );
        Ok(summary)
    }

    /// Scores of the stored verdicts of `oracle_id`.
    #[instrument(skip(self))]
    pub async fn report(
        &self,
        oracle_id: OracleId,
        filter: &SentenceFilter,
    ) -> OracleResult<EvaluationReport> {
        let verdicts: HashMap<QueryId, Verdict> = self
            .store
            .load_verdicts(oracle_id)
            .await?
            .into_iter()
            .map(|v| (v.query_id, v.verdict))
            .collect();

        let sentences = self.selected_sentences(filter).await?;
        let mut scored = Vec::new();
        let mut queries = 0;
        for record in &sentences {
            for query in self.store.load_queries(record.id).await? {
                queries += 1;
                if let Some(verdict) = verdicts.get(&query.id) {
                    scored.push(ScoredQuery {
                        sentence_id: record.id,
                        query_id: query.id,
                        label: record.sentence.correct_answer_label,
                        verdict: *verdict,
                    });
                }
            }
        }

        let mut histogram = BTreeMap::new();
        for q in &scored {
            *histogram.entry(q.verdict).or_insert(0) += 1;
        }
        let confusion = ConfusionMatrix::from_pairs(scored.iter().map(|q| (q.label, q.verdict)));
        Ok(EvaluationReport {
            oracle_id,
            sentences: sentences.len(),
            queries,
            unscored: queries - scored.len(),
            histogram,
            precision: confusion.precision(),
            recall: confusion.recall(),
            f1: confusion.f1(),
            confusion,
            consistency: consistency(&scored),
        })
    }
}
