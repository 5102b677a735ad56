//! HTTP message types for the query endpoint. Client ↔ server JSON.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Client → server: request body of `POST <endpoint>`.
#[derive(Debug, Clone, Serialize)]
pub struct QueryRequest<'a> {
    pub query_text: &'a str,
}

impl<'a> QueryRequest<'a> {
    pub fn new(query_text: &'a str) -> Self {
        Self { query_text }
    }
}

/// Server → client: raw response body. `sources` is tolerated in any shape.
#[derive(Debug, Deserialize)]
struct ResponseBody {
    response: String,
    #[serde(default)]
    sources: Option<Vec<serde_json::Value>>,
}

/// A successful answer from the service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResponse {
    pub response: String,
    /// Ids of the documents the answer was built from, first-seen order.
    pub sources: Vec<String>,
}

impl QueryResponse {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            sources: Vec::new(),
        }
    }

    /// Parse a response body. Fails when `response` is missing or not a string.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let body: ResponseBody = serde_json::from_str(text)?;
        let sources = body
            .sources
            .unwrap_or_default()
            .into_iter()
            .filter_map(|value| match value {
                serde_json::Value::String(s) => Some(s),
                _ => None,
            })
            .collect();
        Ok(Self {
            response: body.response,
            sources: deduplicate_sources(sources),
        })
    }
}

fn deduplicate_sources(sources: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for source in sources {
        if seen.insert(source.clone()) {
            unique.push(source);
        }
    }
    unique
}
