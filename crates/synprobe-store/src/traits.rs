//! Store trait definitions

use crate::error::StoreResult;
use async_trait::async_trait;
use synprobe_types::{
    ModelParameter, OracleDescription, OracleId, OracleVerdict, QueryId, QueryRecord, SentenceId,
    SentenceRecord, TestQuery, TestSentence,
};

/// Combined store trait
#[async_trait]
pub trait ResultStore:
    SentenceStore + QueryStore + VerdictStore + ParameterStore + OracleDescriptionStore + Send + Sync
{
}

/// Storage for test sentences
#[async_trait]
pub trait SentenceStore: Send + Sync {
    /// Persist a test sentence and return its identifier
    async fn store_sentence(&self, sentence: TestSentence) -> StoreResult<SentenceId>;

    /// All stored sentences in insertion (identifier) order
    async fn load_sentences(&self) -> StoreResult<Vec<SentenceRecord>>;

    /// The most recently stored sentence
    async fn last_sentence(&self) -> StoreResult<Option<SentenceRecord>> {
        Ok(self
            .load_sentences()
            .await?
            .into_iter()
            .max_by_key(|record| record.id))
    }
}

/// Storage for test queries
#[async_trait]
pub trait QueryStore: Send + Sync {
    /// Persist a query of a sentence. Keyed by `(sentence_id, ordinal)`:
    /// storing the same ordinal again replaces the query and returns the
    /// existing identifier.
    async fn store_query(
        &self,
        sentence_id: SentenceId,
        query: TestQuery,
    ) -> StoreResult<QueryId>;

    /// Queries of one sentence in identifier order
    async fn load_queries(&self, sentence_id: SentenceId) -> StoreResult<Vec<QueryRecord>>;
}

/// Storage for oracle verdicts
#[async_trait]
pub trait VerdictStore: Send + Sync {
    /// Insert or replace the verdict for `(query_id, oracle_id)`
    async fn upsert_verdict(&self, verdict: OracleVerdict) -> StoreResult<()>;

    /// All verdicts produced by one oracle
    async fn load_verdicts(&self, oracle_id: OracleId) -> StoreResult<Vec<OracleVerdict>>;
}

/// Storage for model parameters of a run
#[async_trait]
pub trait ParameterStore: Send + Sync {
    async fn store_parameters(&self, parameters: Vec<ModelParameter>) -> StoreResult<()>;

    async fn load_parameters(&self, sentence_id: SentenceId) -> StoreResult<Vec<ModelParameter>>;
}

/// Storage for oracle descriptions
#[async_trait]
pub trait OracleDescriptionStore: Send + Sync {
    /// Insert or replace the description with the same identifier
    async fn upsert_oracle_description(&self, description: OracleDescription) -> StoreResult<()>;

    async fn load_oracle_descriptions(&self) -> StoreResult<Vec<OracleDescription>>;
}
