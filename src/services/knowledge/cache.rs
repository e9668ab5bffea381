//! Response Cache
//!
//! Memoizes knowledge retrieval by query fingerprint. The cache uses
//! `mini_moka::sync::Cache` (bounded size, TTL expiry, LRU-style eviction)
//! and is safe to share across tasks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use mini_moka::sync::{Cache, ConcurrentCacheExt};
use prose_cascade_core::KnowledgeChunk;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Cache key: `top_k` plus SHA-256 of the normalized query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    top_k: usize,
    text_hash: [u8; 32],
}

impl CacheKey {
    fn new(query: &str, top_k: usize) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(normalize_query(query).as_bytes());
        Self {
            top_k,
            text_hash: hasher.finalize().into(),
        }
    }

    fn fingerprint(&self) -> String {
        let mut hex = String::with_capacity(64 + 8);
        for byte in self.text_hash {
            hex.push_str(&format!("{:02x}", byte));
        }
        format!("{}:{}", hex, self.top_k)
    }
}

/// Lowercase, collapse whitespace, trim.
pub fn normalize_query(query: &str) -> String {
    query
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Fingerprint for a query and result size.
pub fn query_fingerprint(query: &str, top_k: usize) -> String {
    CacheKey::new(query, top_k).fingerprint()
}

/// A cached retrieval result. Never mutated after creation.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub query_fingerprint: String,
    pub chunks: Vec<KnowledgeChunk>,
    pub created_at: DateTime<Utc>,
}

/// Hit/miss counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: u64,
}

/// Retrieval cache shared by all resolutions.
pub struct ResponseCache {
    cache: Cache<CacheKey, Arc<CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResponseCache {
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(max_entries)
                .time_to_live(ttl)
                .build(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Cached chunks for this query, if present and not expired.
    pub fn get(&self, query: &str, top_k: usize) -> Option<Vec<KnowledgeChunk>> {
        let key = CacheKey::new(query, top_k);
        match self.cache.get(&key) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(fingerprint = %entry.query_fingerprint, "Knowledge cache hit");
                Some(entry.chunks.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store chunks for this query.
    pub fn put(&self, query: &str, top_k: usize, chunks: Vec<KnowledgeChunk>) {
        let key = CacheKey::new(query, top_k);
        let entry = CacheEntry {
            query_fingerprint: key.fingerprint(),
            chunks,
            created_at: Utc::now(),
        };
        self.cache.insert(key, Arc::new(entry));
    }

    /// Full entry for this query, without touching the counters.
    pub fn entry(&self, query: &str, top_k: usize) -> Option<Arc<CacheEntry>> {
        self.cache.get(&CacheKey::new(query, top_k))
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.sync();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.cache.entry_count(),
        }
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&self) {
        self.cache.invalidate_all();
        self.cache.sync();
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(1_000, Duration::from_secs(3_600))
    }
}
