//! In-memory store implementation

use super::traits::*;
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use synprobe_types::{
    ModelParameter, OracleDescription, OracleId, OracleVerdict, QueryId, QueryRecord, SentenceId,
    SentenceRecord, TestQuery, TestSentence,
};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct QueryTable {
    records: BTreeMap<QueryId, QueryRecord>,
    by_ordinal: HashMap<(SentenceId, u32), QueryId>,
}

/// In-memory store for development and testing
#[derive(Debug)]
pub struct InMemoryStore {
    sentences: Arc<RwLock<BTreeMap<SentenceId, TestSentence>>>,
    queries: Arc<RwLock<QueryTable>>,
    verdicts: Arc<RwLock<BTreeMap<(QueryId, OracleId), OracleVerdict>>>,
    parameters: Arc<RwLock<Vec<ModelParameter>>>,
    descriptions: Arc<RwLock<BTreeMap<OracleId, OracleDescription>>>,
    sentence_sequence: Arc<AtomicI64>,
    query_sequence: Arc<AtomicI64>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Create an empty store. Identifiers start at 1.
    pub fn new() -> Self {
        Self {
            sentences: Arc::new(RwLock::new(BTreeMap::new())),
            queries: Arc::new(RwLock::new(QueryTable::default())),
            verdicts: Arc::new(RwLock::new(BTreeMap::new())),
            parameters: Arc::new(RwLock::new(Vec::new())),
            descriptions: Arc::new(RwLock::new(BTreeMap::new())),
            sentence_sequence: Arc::new(AtomicI64::new(0)),
            query_sequence: Arc::new(AtomicI64::new(0)),
        }
    }
}

#[async_trait]
impl SentenceStore for InMemoryStore {
    async fn store_sentence(&self, sentence: TestSentence) -> StoreResult<SentenceId> {
        let id = SentenceId(self.sentence_sequence.fetch_add(1, Ordering::SeqCst) + 1);
        let mut sentences = self.sentences.write().await;
        sentences.insert(id, sentence);
        Ok(id)
    }

    async fn load_sentences(&self) -> StoreResult<Vec<SentenceRecord>> {
        let sentences = self.sentences.read().await;
        Ok(sentences
            .iter()
            .map(|(id, sentence)| SentenceRecord {
                id: *id,
                sentence: sentence.clone(),
            })
            .collect())
    }

    async fn last_sentence(&self) -> StoreResult<Option<SentenceRecord>> {
        let sentences = self.sentences.read().await;
        Ok(sentences
            .iter()
            .next_back()
            .map(|(id, sentence)| SentenceRecord {
                id: *id,
                sentence: sentence.clone(),
            }))
    }
}

#[async_trait]
impl QueryStore for InMemoryStore {
    async fn store_query(&self, sentence_id: SentenceId, query: TestQuery) -> StoreResult<QueryId> {
        if !self.sentences.read().await.contains_key(&sentence_id) {
            return Err(StoreError::NotFound(format!("sentence {}", sentence_id)));
        }
        let mut queries = self.queries.write().await;
        let id = match queries.by_ordinal.get(&(sentence_id, query.ordinal)) {
            Some(id) => *id,
            None => {
                let id = QueryId(self.query_sequence.fetch_add(1, Ordering::SeqCst) + 1);
                queries.by_ordinal.insert((sentence_id, query.ordinal), id);
                id
            }
        };
        queries.records.insert(
            id,
            QueryRecord {
                id,
                sentence_id,
                query,
            },
        );
        Ok(id)
    }

    async fn load_queries(&self, sentence_id: SentenceId) -> StoreResult<Vec<QueryRecord>> {
        let queries = self.queries.read().await;
        Ok(queries
            .records
            .values()
            .filter(|q| q.sentence_id == sentence_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl VerdictStore for InMemoryStore {
    async fn upsert_verdict(&self, verdict: OracleVerdict) -> StoreResult<()> {
        if !self.queries.read().await.records.contains_key(&verdict.query_id) {
            return Err(StoreError::NotFound(format!("query {}", verdict.query_id)));
        }
        let mut verdicts = self.verdicts.write().await;
        verdicts.insert(verdict.key(), verdict);
        Ok(())
    }

    async fn load_verdicts(&self, oracle_id: OracleId) -> StoreResult<Vec<OracleVerdict>> {
        let verdicts = self.verdicts.read().await;
        Ok(verdicts
            .values()
            .filter(|v| v.oracle_id == oracle_id)
            .copied()
            .collect())
    }
}

#[async_trait]
impl ParameterStore for InMemoryStore {
    async fn store_parameters(&self, parameters: Vec<ModelParameter>) -> StoreResult<()> {
        let mut stored = self.parameters.write().await;
        for parameter in parameters {
            match stored.iter_mut().find(|p| {
                p.sentence_id == parameter.sentence_id && p.parameter == parameter.parameter
            }) {
                Some(existing) => existing.value = parameter.value,
                None => stored.push(parameter),
            }
        }
        Ok(())
    }

    async fn load_parameters(&self, sentence_id: SentenceId) -> StoreResult<Vec<ModelParameter>> {
        let parameters = self.parameters.read().await;
        Ok(parameters
            .iter()
            .filter(|p| p.sentence_id == sentence_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl OracleDescriptionStore for InMemoryStore {
    async fn upsert_oracle_description(&self, description: OracleDescription) -> StoreResult<()> {
        let mut descriptions = self.descriptions.write().await;
        descriptions.insert(description.id, description);
        Ok(())
    }

    async fn load_oracle_descriptions(&self) -> StoreResult<Vec<OracleDescription>> {
        let descriptions = self.descriptions.read().await;
        Ok(descriptions.values().cloned().collect())
    }
}

impl ResultStore for InMemoryStore {}

#[cfg(test)]
mod tests {
    use super::*;
    use synprobe_types::{Label, Verdict};

    fn sentence(text: &str) -> TestSentence {
        TestSentence {
            sentence: text.to_string(),
            original_response: String::new(),
            correct_answer_label: Label::True,
            source_data_name: String::new(),
            model_name: "T5".to_string(),
            ca_file: "0,0\n".to_string(),
            ipm_file: "[]".to_string(),
            strength: 2,
            note: String::new(),
        }
    }

    fn query(ordinal: u32, response: &str) -> TestQuery {
        TestQuery {
            ordinal,
            modified_question: format!("q{}", ordinal),
            new_response: response.to_string(),
        }
    }

    #[tokio::test]
    async fn sentence_ids_follow_insertion_order() {
        let store = InMemoryStore::new();
        let a = store.store_sentence(sentence("S1")).await.unwrap();
        let b = store.store_sentence(sentence("S2")).await.unwrap();
        assert!(a < b);

        let last = store.last_sentence().await.unwrap().unwrap();
        assert_eq!(last.id, b);
        assert_eq!(last.sentence.sentence, "S2");
    }

    #[tokio::test]
    async fn empty_store_has_no_last_sentence() {
        let store = InMemoryStore::new();
        assert!(store.last_sentence().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn storing_an_ordinal_twice_keeps_one_query() {
        let store = InMemoryStore::new();
        let s = store.store_sentence(sentence("S1")).await.unwrap();
        let first = store.store_query(s, query(0, "yes")).await.unwrap();
        let again = store.store_query(s, query(0, "no")).await.unwrap();
        assert_eq!(first, again);

        let queries = store.load_queries(s).await.unwrap();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].query.new_response, "no");
    }

    #[tokio::test]
    async fn query_for_unknown_sentence_is_rejected() {
        let store = InMemoryStore::new();
        let err = store.store_query(SentenceId(9), query(0, "yes")).await;
        assert!(matches!(err, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn verdicts_are_upserted_per_query_and_oracle() {
        let store = InMemoryStore::new();
        let s = store.store_sentence(sentence("S1")).await.unwrap();
        let q = store.store_query(s, query(0, "yes")).await.unwrap();

        for verdict in [Verdict::Undefined, Verdict::True] {
            store
                .upsert_verdict(OracleVerdict {
                    oracle_id: OracleId(1),
                    query_id: q,
                    verdict,
                })
                .await
                .unwrap();
        }
        let stored = store.load_verdicts(OracleId(1)).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].verdict, Verdict::True);
        assert!(store.load_verdicts(OracleId(2)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn parameters_are_scoped_to_their_sentence() {
        let store = InMemoryStore::new();
        let s1 = store.store_sentence(sentence("S1")).await.unwrap();
        let s2 = store.store_sentence(sentence("S2")).await.unwrap();
        store
            .store_parameters(vec![
                ModelParameter {
                    sentence_id: s1,
                    parameter: "model".into(),
                    value: "T5".into(),
                },
                ModelParameter {
                    sentence_id: s2,
                    parameter: "model".into(),
                    value: "LLAMA".into(),
                },
            ])
            .await
            .unwrap();
        let p = store.load_parameters(s2).await.unwrap();
        assert_eq!(p.len(), 1);
        assert_eq!(p[0].value, "LLAMA");
    }
}
