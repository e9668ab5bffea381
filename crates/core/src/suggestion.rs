//! Suggestion Model
//!
//! The single value produced by every resolution call, tagged with the
//! strategy that produced it and its provenance in the knowledge store.

use serde::{Deserialize, Serialize};

/// How confident the pipeline is in a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::High => write!(f, "high"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::Low => write!(f, "low"),
        }
    }
}

/// Strategy that produced a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionMethod {
    /// Rule-based phrase rewrite, no model involved
    Deterministic,
    /// Model output grounded in retrieved knowledge
    KnowledgeLlm,
    /// Model output without retrieved knowledge
    LlmOnly,
    /// Network-free pattern transformation
    Emergency,
    /// Advice only, nothing to rewrite
    GuidanceFallback,
}

impl std::fmt::Display for SuggestionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuggestionMethod::Deterministic => write!(f, "deterministic"),
            SuggestionMethod::KnowledgeLlm => write!(f, "knowledge_llm"),
            SuggestionMethod::LlmOnly => write!(f, "llm_only"),
            SuggestionMethod::Emergency => write!(f, "emergency"),
            SuggestionMethod::GuidanceFallback => write!(f, "guidance_fallback"),
        }
    }
}

/// Provenance pointer into the knowledge store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRef {
    /// Identifier of the guidance rule the passage belongs to
    pub rule_id: String,
    /// Title of the guidance passage
    pub title: String,
    /// Similarity score reported by the store
    pub similarity: f32,
}

/// The pipeline's proposed fix plus metadata about how it was produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    /// Suggested rewrite (or annotated guidance when no rewrite exists)
    pub text: String,
    /// Confidence in the suggestion
    pub confidence: Confidence,
    /// Strategy that produced it
    pub method: SuggestionMethod,
    /// Knowledge passages that informed it
    #[serde(default)]
    pub sources: Vec<SourceRef>,
    /// Sentence the suggestion rewrites
    pub original_sentence: String,
    /// Whether a concrete rewrite was produced
    pub success: bool,
    /// Explanatory advice for the author
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guidance: Option<String>,
}

impl Suggestion {
    /// Create a successful rewrite suggestion.
    pub fn rewrite(
        text: impl Into<String>,
        original_sentence: impl Into<String>,
        method: SuggestionMethod,
        confidence: Confidence,
    ) -> Self {
        Self {
            text: text.into(),
            confidence,
            method,
            sources: Vec::new(),
            original_sentence: original_sentence.into(),
            success: true,
            guidance: None,
        }
    }

    /// Create an advice-only suggestion.
    pub fn guidance_only(
        text: impl Into<String>,
        original_sentence: impl Into<String>,
        method: SuggestionMethod,
        guidance: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            confidence: Confidence::Low,
            method,
            sources: Vec::new(),
            original_sentence: original_sentence.into(),
            success: false,
            guidance: Some(guidance.into()),
        }
    }

    /// Attach knowledge provenance.
    pub fn with_sources(mut self, sources: Vec<SourceRef>) -> Self {
        self.sources = sources;
        self
    }

    /// Attach explanatory guidance.
    pub fn with_guidance(mut self, guidance: impl Into<String>) -> Self {
        self.guidance = Some(guidance.into());
        self
    }
}
