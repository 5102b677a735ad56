//! HTTP client: POST the query text, parse the answer.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::messages::{QueryRequest, QueryResponse};

/// Failure of one outbound call.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {0}")]
    Status(StatusCode),
    #[error("malformed response body: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl ClientError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Http(e) if e.is_timeout())
    }
}

/// Anything that can answer a query. The controller only sees this trait.
#[async_trait]
pub trait QueryBackend: Send + Sync {
    async fn ask(&self, query_text: &str) -> Result<QueryResponse, ClientError>;
}

/// HTTP client bound to one endpoint.
#[derive(Debug, Clone)]
pub struct QueryClient {
    http: reqwest::Client,
    endpoint: String,
}

impl QueryClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        Self::new(config.endpoint_url(), config.timeout())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send `query_text` and wait for the answer.
    pub async fn query(&self, query_text: &str) -> Result<QueryResponse, ClientError> {
        debug!(endpoint = %self.endpoint, "posting query");
        let response = self
            .http
            .post(&self.endpoint)
            .json(&QueryRequest::new(query_text))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status(status));
        }

        let body = response.text().await?;
        let answer = QueryResponse::from_json(&body)?;
        debug!(sources = answer.sources.len(), "query answered");
        Ok(answer)
    }
}

#[async_trait]
impl QueryBackend for QueryClient {
    async fn ask(&self, query_text: &str) -> Result<QueryResponse, ClientError> {
        self.query(query_text).await
    }
}
