//! Knowledge Retriever
//!
//! Cache-first lookup of writing guidance. Retrieval is best-effort: any
//! store error, timeout or cancellation yields an empty result.

use std::sync::Arc;
use std::time::Duration;

use prose_cascade_core::KnowledgeChunk;
use tokio_util::sync::CancellationToken;

use super::cache::ResponseCache;
use super::store::{KnowledgeError, VectorStore};

/// Queries a vector store through the response cache.
pub struct KnowledgeRetriever {
    store: Option<Arc<dyn VectorStore>>,
    cache: Arc<ResponseCache>,
    min_similarity: f32,
    timeout: Duration,
}

impl KnowledgeRetriever {
    pub fn new(
        store: Arc<dyn VectorStore>,
        cache: Arc<ResponseCache>,
        min_similarity: f32,
        timeout: Duration,
    ) -> Self {
        Self {
            store: Some(store),
            cache,
            min_similarity,
            timeout,
        }
    }

    /// Retriever with no store; every lookup returns nothing.
    pub fn disabled() -> Self {
        Self {
            store: None,
            cache: Arc::new(ResponseCache::default()),
            min_similarity: 0.0,
            timeout: Duration::from_secs(1),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    /// Up to `top_k` passages for `query`, best first.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Vec<KnowledgeChunk> {
        self.retrieve_with_cancel(query, top_k, &CancellationToken::new())
            .await
    }

    /// As `retrieve`, abandoning the store query when `cancel` fires.
    /// Cancelled results are never cached.
    pub async fn retrieve_with_cancel(
        &self,
        query: &str,
        top_k: usize,
        cancel: &CancellationToken,
    ) -> Vec<KnowledgeChunk> {
        let Some(store) = &self.store else {
            return Vec::new();
        };
        if query.trim().is_empty() || top_k == 0 {
            return Vec::new();
        }

        if let Some(chunks) = self.cache.get(query, top_k) {
            return chunks;
        }

        let result = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("Knowledge retrieval cancelled");
                return Vec::new();
            }
            result = tokio::time::timeout(self.timeout, store.query(query, top_k)) => result,
        };

        let mut chunks = match result {
            Ok(Ok(chunks)) => chunks,
            Ok(Err(e)) => {
                tracing::warn!(store = store.name(), "Knowledge retrieval failed: {}", e);
                return Vec::new();
            }
            Err(_) => {
                let err = KnowledgeError::Timeout(self.timeout.as_millis() as u64);
                tracing::warn!(store = store.name(), "Knowledge retrieval failed: {}", err);
                return Vec::new();
            }
        };

        chunks.retain(|c| c.similarity >= self.min_similarity);
        chunks.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        chunks.truncate(top_k);

        if cancel.is_cancelled() {
            return Vec::new();
        }
        self.cache.put(query, top_k, chunks.clone());
        tracing::debug!(
            store = store.name(),
            count = chunks.len(),
            "Retrieved knowledge passages"
        );
        chunks
    }
}
