//! Vector Store Abstraction
//!
//! Defines the async `VectorStore` trait for pluggable knowledge backends.
//! `HttpVectorStore` talks to a remote similarity-search service;
//! `InMemoryVectorStore` scores a local JSON corpus.

use async_trait::async_trait;
use prose_cascade_core::KnowledgeChunk;
use thiserror::Error;

/// Errors that can occur while querying a vector store.
///
/// The retriever logs and swallows these; they never reach a caller of
/// `resolve`.
#[derive(Error, Debug)]
pub enum KnowledgeError {
    /// Connection or transport failure
    #[error("store request failed: {0}")]
    Request(String),

    /// Non-success HTTP status
    #[error("store returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Query exceeded its deadline
    #[error("store query timed out after {0}ms")]
    Timeout(u64),

    /// Response body could not be understood
    #[error("invalid store response: {0}")]
    InvalidResponse(String),

    /// Local corpus could not be loaded
    #[error("corpus error: {0}")]
    Corpus(String),

    /// Local corpus I/O failure
    #[error("corpus I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for KnowledgeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            KnowledgeError::InvalidResponse(err.to_string())
        } else {
            KnowledgeError::Request(err.to_string())
        }
    }
}

/// A similarity-search backend over writing guidance.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Store name used in logs.
    fn name(&self) -> &str;

    /// Return up to `top_k` passages related to `text`, each carrying the
    /// store's similarity score.
    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<KnowledgeChunk>, KnowledgeError>;
}

/// Convert a JSON metadata value to the flat string form chunks carry.
pub(crate) fn metadata_value_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}
