//! Knowledge Retrieval
//!
//! Vector store backends, the response cache and the cache-first retriever.

pub mod cache;
pub mod retriever;
pub mod store;
pub mod store_http;
pub mod store_memory;

pub use cache::{normalize_query, query_fingerprint, CacheEntry, CacheStats, ResponseCache};
pub use retriever::KnowledgeRetriever;
pub use store::{KnowledgeError, VectorStore};
pub use store_http::HttpVectorStore;
pub use store_memory::{CorpusDocument, InMemoryVectorStore};
