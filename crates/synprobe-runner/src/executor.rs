//! Query execution against the model under test.
//!
//! Transport failures (timeouts, refused connections) are retried with a
//! fixed delay up to a fixed number of attempts. A non-success status is not
//! retried. Either way the caller gets an [`ExecutionFailure`] value and the
//! run moves on to the next query.

use crate::error::{RunnerError, RunnerResult};
use crate::session::PromptSettings;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, instrument};

/// Longest response body kept in an [`ExecutionFailure`].
const MAX_FAILURE_BODY: usize = 512;

/// A request that never produced a response.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else {
            TransportError::Other(e.to_string())
        }
    }
}

/// Raw answer of the model service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelResponse {
    pub status: u16,
    pub body: String,
}

impl ModelResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The model-query capability.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn query(&self, model: &str, prompt: &str) -> Result<ModelResponse, TransportError>;

    /// Push settings and return the settings the service reports as
    /// effective.
    async fn update_settings(
        &self,
        model: &str,
        settings: &Value,
    ) -> Result<ModelResponse, TransportError>;
}

/// Client for the model executor service:
/// `GET {endpoint}/query/{model}?prompt=...` and
/// `POST {endpoint}/{model}/settings`.
pub struct HttpModelClient {
    client: Client,
    base_url: String,
}

impl HttpModelClient {
    pub fn new(endpoint: &str, timeout: Duration) -> RunnerResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RunnerError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: endpoint.trim_end_matches('/').to_string(),
        })
    }

    async fn into_response(response: reqwest::Response) -> Result<ModelResponse, TransportError> {
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(ModelResponse { status, body })
    }
}

#[async_trait]
impl ModelClient for HttpModelClient {
    async fn query(&self, model: &str, prompt: &str) -> Result<ModelResponse, TransportError> {
        let url = format!("{}/query/{}", self.base_url, model);
        let response = self
            .client
            .get(&url)
            .query(&[("prompt", prompt)])
            .send()
            .await?;
        Self::into_response(response).await
    }

    async fn update_settings(
        &self,
        model: &str,
        settings: &Value,
    ) -> Result<ModelResponse, TransportError> {
        let url = format!("{}/{}/settings", self.base_url, model);
        let response = self.client.post(&url).json(settings).send().await?;
        Self::into_response(response).await
    }
}

/// A successfully answered query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    /// The prompt as submitted, prefix and postfix included.
    pub prompt: String,
    pub response: String,
}

/// A query that produced no usable response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionFailure {
    pub prompt: String,
    pub attempts: u32,
    /// Status of the last response, if one arrived.
    pub status: Option<u16>,
    pub detail: String,
}

impl fmt::Display for ExecutionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(
                f,
                "model responded with status {} after {} attempt(s): {}",
                status, self.attempts, self.detail
            ),
            None => write!(
                f,
                "no response after {} attempt(s): {}",
                self.attempts, self.detail
            ),
        }
    }
}

/// Submits queries with bounded retry.
pub struct QueryExecutor {
    client: Arc<dyn ModelClient>,
    max_attempts: u32,
    retry_delay: Duration,
}

impl QueryExecutor {
    pub fn new(client: Arc<dyn ModelClient>, max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            client,
            max_attempts: max_attempts.max(1),
            retry_delay,
        }
    }

    /// Wrap `query` with the prompt settings and submit it to `model`.
    #[instrument(skip(self, prompt_settings))]
    pub async fn execute(
        &self,
        query: &str,
        model: &str,
        prompt_settings: &PromptSettings,
    ) -> Result<Execution, ExecutionFailure> {
        let prompt = prompt_settings.wrap(query);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.client.query(model, &prompt).await {
                Ok(response) if response.is_success() => {
                    debug!(attempt, "model answered");
                    return Ok(Execution {
                        prompt,
                        response: response.body,
                    });
                }
                Ok(response) => {
                    let detail = truncate(&response.body);
                    error!(
                        status = response.status,
                        body = %detail,
                        "model service responded with an error"
                    );
                    return Err(ExecutionFailure {
                        prompt,
                        attempts: attempt,
                        status: Some(response.status),
                        detail,
                    });
                }
                Err(e) if attempt < self.max_attempts => {
                    info!(
                        attempt,
                        error = %e,
                        delay_secs = self.retry_delay.as_secs(),
                        "model request failed, retrying"
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => {
                    error!(attempts = attempt, error = %e, "model request failed, giving up");
                    return Err(ExecutionFailure {
                        prompt,
                        attempts: attempt,
                        status: None,
                        detail: e.to_string(),
                    });
                }
            }
        }
    }

    /// Push `settings` for `model` and return the effective settings.
    pub async fn update_settings(&self, model: &str, settings: &Value) -> RunnerResult<Value> {
        let response = self
            .client
            .update_settings(model, settings)
            .await
            .map_err(|e| RunnerError::Model(e.to_string()))?;
        if !response.is_success() {
            return Err(RunnerError::Model(format!(
                "settings update for {} rejected with status {}: {}",
                model,
                response.status,
                truncate(&response.body)
            )));
        }
        Ok(serde_json::from_str(&response.body)?)
    }
}

fn truncate(body: &str) -> String {
    if body.len() <= MAX_FAILURE_BODY {
        return body.to_string();
    }
    let mut end = MAX_FAILURE_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    body[..end].to_string()
}
