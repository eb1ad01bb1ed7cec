//! Bounded retry for store operations.

use super::traits::*;
use crate::error::StoreResult;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use synprobe_types::{
    ModelParameter, OracleDescription, OracleId, OracleVerdict, QueryId, QueryRecord, SentenceId,
    SentenceRecord, TestQuery, TestSentence,
};
use tracing::{error, warn};

/// Fixed-delay retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included. Zero is treated as one.
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Run `op` until it succeeds, fails permanently or runs out of
    /// attempts. Only transient errors are retried.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> StoreResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = StoreResult<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    warn!(operation, attempt, error = %e, "store operation failed, retrying");
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(operation, attempt, error = %e, "store operation failed");
                    return Err(e);
                }
            }
        }
    }
}

/// A store whose operations are retried under a [`RetryPolicy`].
///
/// Query, verdict, parameter and description writes are keyed upserts and
/// safe to repeat. A sentence write whose response is lost after the store
/// committed it can produce a second sentence record.
pub struct RetryingStore<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S> RetryingStore<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<S: SentenceStore> SentenceStore for RetryingStore<S> {
    async fn store_sentence(&self, sentence: TestSentence) -> StoreResult<SentenceId> {
        self.policy
            .run("store_sentence", || self.inner.store_sentence(sentence.clone()))
            .await
    }

    async fn load_sentences(&self) -> StoreResult<Vec<SentenceRecord>> {
        self.policy
            .run("load_sentences", || self.inner.load_sentences())
            .await
    }

    async fn last_sentence(&self) -> StoreResult<Option<SentenceRecord>> {
        self.policy
            .run("last_sentence", || self.inner.last_sentence())
            .await
    }
}

#[async_trait]
impl<S: QueryStore> QueryStore for RetryingStore<S> {
    async fn store_query(&self, sentence_id: SentenceId, query: TestQuery) -> StoreResult<QueryId> {
        self.policy
            .run("store_query", || {
                self.inner.store_query(sentence_id, query.clone())
            })
            .await
    }

    async fn load_queries(&self, sentence_id: SentenceId) -> StoreResult<Vec<QueryRecord>> {
        self.policy
            .run("load_queries", || self.inner.load_queries(sentence_id))
            .await
    }
}

#[async_trait]
impl<S: VerdictStore> VerdictStore for RetryingStore<S> {
    async fn upsert_verdict(&self, verdict: OracleVerdict) -> StoreResult<()> {
        self.policy
            .run("upsert_verdict", || self.inner.upsert_verdict(verdict))
            .await
    }

    async fn load_verdicts(&self, oracle_id: OracleId) -> StoreResult<Vec<OracleVerdict>> {
        self.policy
            .run("load_verdicts", || self.inner.load_verdicts(oracle_id))
            .await
    }
}

#[async_trait]
impl<S: ParameterStore> ParameterStore for RetryingStore<S> {
    async fn store_parameters(&self, parameters: Vec<ModelParameter>) -> StoreResult<()> {
        self.policy
            .run("store_parameters", || {
                self.inner.store_parameters(parameters.clone())
            })
            .await
    }

    async fn load_parameters(&self, sentence_id: SentenceId) -> StoreResult<Vec<ModelParameter>> {
        self.policy
            .run("load_parameters", || self.inner.load_parameters(sentence_id))
            .await
    }
}

#[async_trait]
impl<S: OracleDescriptionStore> OracleDescriptionStore for RetryingStore<S> {
    async fn upsert_oracle_description(&self, description: OracleDescription) -> StoreResult<()> {
        self.policy
            .run("upsert_oracle_description", || {
                self.inner.upsert_oracle_description(description.clone())
            })
            .await
    }

    async fn load_oracle_descriptions(&self) -> StoreResult<Vec<OracleDescription>> {
        self.policy
            .run("load_oracle_descriptions", || {
                self.inner.load_oracle_descriptions()
            })
            .await
    }
}

impl<S: ResultStore> ResultStore for RetryingStore<S> {}
