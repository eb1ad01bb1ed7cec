//! HTTP client for the result-store service

use super::traits::*;
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use synprobe_types::{
    ModelParameter, OracleDescription, OracleId, OracleVerdict, QueryId, QueryRecord, SentenceId,
    SentenceRecord, TestQuery, TestSentence,
};
use tracing::debug;

/// Longest error body kept in [`StoreError::Api`].
const MAX_ERROR_BODY: usize = 512;

/// Store backed by the result-store HTTP API.
///
/// Writes go to `POST /store/<entity>`; creating writes answer with
/// `{"id": n}`. Reads go to `GET /load/<entities>?return_type=json`.
pub struct HttpStore {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct Created {
    id: i64,
}

#[derive(Debug, Serialize)]
struct QueryBody<'a> {
    sentence_id: SentenceId,
    #[serde(flatten)]
    query: &'a TestQuery,
}

impl HttpStore {
    pub fn new(endpoint: &str, timeout: Duration) -> StoreResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: endpoint.trim_end_matches('/').to_string(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> StoreResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(query)
            .query(&[("return_type", "json")])
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> StoreResult<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "store write");
        let response = self.client.post(&url).json(body).send().await?;
        Self::check(response).await
    }

    async fn create<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> StoreResult<i64> {
        let created: Created = self.post(path, body).await?.json().await?;
        Ok(created.id)
    }

    async fn check(response: reqwest::Response) -> StoreResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else if status == StatusCode::NOT_FOUND {
            Err(StoreError::NotFound(response.url().path().to_string()))
        } else {
            let mut message = response.text().await.unwrap_or_default();
            if message.len() > MAX_ERROR_BODY {
                let mut end = MAX_ERROR_BODY;
                while !message.is_char_boundary(end) {
                    end -= 1;
                }
                message.truncate(end);
            }
            Err(StoreError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait]
impl SentenceStore for HttpStore {
    async fn store_sentence(&self, sentence: TestSentence) -> StoreResult<SentenceId> {
        Ok(SentenceId(self.create("/store/test_sentence", &sentence).await?))
    }

    async fn load_sentences(&self) -> StoreResult<Vec<SentenceRecord>> {
        let mut records: Vec<SentenceRecord> = self.get("/load/test_sentences", &[]).await?;
        records.sort_by_key(|r| r.id);
        Ok(records)
    }
}

#[async_trait]
impl QueryStore for HttpStore {
    async fn store_query(&self, sentence_id: SentenceId, query: TestQuery) -> StoreResult<QueryId> {
        let body = QueryBody {
            sentence_id,
            query: &query,
        };
        Ok(QueryId(self.create("/store/test_query", &body).await?))
    }

    async fn load_queries(&self, sentence_id: SentenceId) -> StoreResult<Vec<QueryRecord>> {
        let mut records: Vec<QueryRecord> = self
            .get("/load/test_queries", &[("sentence_id", sentence_id.to_string())])
            .await?;
        records.sort_by_key(|r| r.id);
        Ok(records)
    }
}

#[async_trait]
impl VerdictStore for HttpStore {
    async fn upsert_verdict(&self, verdict: OracleVerdict) -> StoreResult<()> {
        self.post("/store/oracle_result", &verdict).await?;
        Ok(())
    }

    async fn load_verdicts(&self, oracle_id: OracleId) -> StoreResult<Vec<OracleVerdict>> {
        self.get("/load/oracle_results", &[("oracle_id", oracle_id.to_string())])
            .await
    }
}

#[async_trait]
impl ParameterStore for HttpStore {
    async fn store_parameters(&self, parameters: Vec<ModelParameter>) -> StoreResult<()> {
        self.post("/store/model_parameters", &parameters).await?;
        Ok(())
    }

    async fn load_parameters(&self, sentence_id: SentenceId) -> StoreResult<Vec<ModelParameter>> {
        self.get("/load/model_parameters", &[("sentence_id", sentence_id.to_string())])
            .await
    }
}

#[async_trait]
impl OracleDescriptionStore for HttpStore {
    async fn upsert_oracle_description(&self, description: OracleDescription) -> StoreResult<()> {
        self.post("/store/oracle_description", &description).await?;
        Ok(())
    }

    async fn load_oracle_descriptions(&self) -> StoreResult<Vec<OracleDescription>> {
        self.get("/load/oracle_descriptions", &[]).await
    }
}

impl ResultStore for HttpStore {}
