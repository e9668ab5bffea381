//! HTTP Vector Store
//!
//! `POST {base_url}/query` with `{collection, query, top_k}`, answered by
//! `{results: [{document, metadata, score}]}`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use prose_cascade_core::KnowledgeChunk;
use prose_cascade_llm::build_http_client;
use serde::{Deserialize, Serialize};

use super::store::{metadata_value_to_string, KnowledgeError, VectorStore};

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    collection: &'a str,
    query: &'a str,
    top_k: usize,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<QueryResult>,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    document: String,
    #[serde(default)]
    metadata: HashMap<String, serde_json::Value>,
    #[serde(default)]
    score: f32,
}

impl From<QueryResult> for KnowledgeChunk {
    fn from(result: QueryResult) -> Self {
        KnowledgeChunk {
            text: result.document,
            metadata: result
                .metadata
                .into_iter()
                .map(|(k, v)| (k, metadata_value_to_string(v)))
                .collect(),
            similarity: result.score,
        }
    }
}

/// Remote vector store reached over HTTP.
pub struct HttpVectorStore {
    endpoint: String,
    collection: String,
    client: reqwest::Client,
}

impl HttpVectorStore {
    /// Create a store client. Fails on an unparseable base URL.
    pub fn new(base_url: &str, collection: impl Into<String>) -> Result<Self, KnowledgeError> {
        let base = url::Url::parse(base_url)
            .map_err(|e| KnowledgeError::Request(format!("invalid base_url '{}': {}", base_url, e)))?;
        let endpoint = format!("{}/query", base.as_str().trim_end_matches('/'));
        Ok(Self {
            endpoint,
            collection: collection.into(),
            client: build_http_client(Duration::from_secs(2)),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl VectorStore for HttpVectorStore {
    fn name(&self) -> &str {
        "http"
    }

    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<KnowledgeChunk>, KnowledgeError> {
        let body = QueryRequest {
            collection: &self.collection,
            query: text,
            top_k,
        };
        let response = self.client.post(&self.endpoint).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(KnowledgeError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: QueryResponse = response.json().await?;
        Ok(parsed.results.into_iter().map(KnowledgeChunk::from).collect())
    }
}
