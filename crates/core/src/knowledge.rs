//! Knowledge Chunk
//!
//! A passage of writing guidance retrieved from the vector knowledge store.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::suggestion::SourceRef;

/// Metadata key holding the guidance rule identifier.
pub const META_RULE_ID: &str = "rule_id";
/// Metadata key holding the passage title.
pub const META_TITLE: &str = "title";

/// A retrieved guidance passage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    /// Passage text
    pub text: String,
    /// Store metadata (rule id, title, category, ...)
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Similarity score reported by the store
    #[serde(default)]
    pub similarity: f32,
}

impl KnowledgeChunk {
    /// Create a chunk with no metadata.
    pub fn new(text: impl Into<String>, similarity: f32) -> Self {
        Self {
            text: text.into(),
            metadata: HashMap::new(),
            similarity,
        }
    }

    /// Add a metadata entry.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Provenance pointer for this chunk.
    pub fn source_ref(&self) -> SourceRef {
        let rule_id = self
            .metadata
            .get(META_RULE_ID)
            .cloned()
            .unwrap_or_else(|| "unknown".to_string());
        let title = self
            .metadata
            .get(META_TITLE)
            .cloned()
            .unwrap_or_else(|| rule_id.clone());
        SourceRef {
            rule_id,
            title,
            similarity: self.similarity,
        }
    }
}
