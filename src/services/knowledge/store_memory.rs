//! In-Memory Vector Store
//!
//! Term-overlap cosine scoring over a small local corpus. Used offline and
//! in tests; no embeddings are involved.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use prose_cascade_core::KnowledgeChunk;
use serde::{Deserialize, Serialize};

use super::store::{metadata_value_to_string, KnowledgeError, VectorStore};

/// Words too common to carry meaning for matching.
const STOPWORDS: &[&str] = &[
    "the", "and", "for", "are", "was", "were", "with", "that", "this", "from", "into", "than",
    "then", "its", "has", "have", "had", "not", "but", "you", "your", "can", "will", "use",
];

/// One corpus entry as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusDocument {
    pub document: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

struct IndexedDocument {
    text: String,
    metadata: HashMap<String, String>,
    terms: HashMap<String, f32>,
    norm: f32,
}

fn term_counts(text: &str) -> HashMap<String, f32> {
    let mut counts = HashMap::new();
    for word in text.split(|c: char| !c.is_alphanumeric()) {
        let word = word.to_lowercase();
        if word.len() < 3 || STOPWORDS.contains(&word.as_str()) {
            continue;
        }
        *counts.entry(word).or_insert(0.0) += 1.0;
    }
    counts
}

fn norm(terms: &HashMap<String, f32>) -> f32 {
    terms.values().map(|v| v * v).sum::<f32>().sqrt()
}

/// Corpus held in memory and scored per query.
pub struct InMemoryVectorStore {
    documents: Vec<IndexedDocument>,
}

impl InMemoryVectorStore {
    /// Index a set of documents.
    pub fn from_documents(documents: Vec<CorpusDocument>) -> Self {
        let documents = documents
            .into_iter()
            .map(|doc| {
                let terms = term_counts(&doc.document);
                let norm = norm(&terms);
                IndexedDocument {
                    text: doc.document,
                    metadata: doc
                        .metadata
                        .into_iter()
                        .map(|(k, v)| (k, metadata_value_to_string(v)))
                        .collect(),
                    terms,
                    norm,
                }
            })
            .collect();
        Self { documents }
    }

    /// Load a JSON array of `{document, metadata}` entries.
    pub fn from_json_file(path: &Path) -> Result<Self, KnowledgeError> {
        let content = std::fs::read_to_string(path)?;
        let documents: Vec<CorpusDocument> = serde_json::from_str(&content)
            .map_err(|e| KnowledgeError::Corpus(format!("{}: {}", path.display(), e)))?;
        tracing::info!(
            "Loaded {} knowledge documents from {}",
            documents.len(),
            path.display()
        );
        Ok(Self::from_documents(documents))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn score(query: &HashMap<String, f32>, query_norm: f32, doc: &IndexedDocument) -> f32 {
        if query_norm == 0.0 || doc.norm == 0.0 {
            return 0.0;
        }
        let dot: f32 = query
            .iter()
            .filter_map(|(term, weight)| doc.terms.get(term).map(|w| w * weight))
            .sum();
        dot / (query_norm * doc.norm)
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<KnowledgeChunk>, KnowledgeError> {
        let query = term_counts(text);
        let query_norm = norm(&query);

        let mut scored: Vec<KnowledgeChunk> = self
            .documents
            .iter()
            .filter_map(|doc| {
                let score = Self::score(&query, query_norm, doc);
                (score > 0.0).then(|| KnowledgeChunk {
                    text: doc.text.clone(),
                    metadata: doc.metadata.clone(),
                    similarity: score,
                })
            })
            .collect();
        scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        scored.truncate(top_k);
        Ok(scored)
    }
}
