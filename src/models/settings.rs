//! Settings Models
//!
//! Application configuration stored in config.json.

use std::path::PathBuf;

use prose_cascade_llm::{BackendConfig, DEFAULT_DAILY_LIMIT};
use prose_cascade_quality_gates::QualityConfig;
use serde::{Deserialize, Serialize};

use crate::services::resolution::tiers::{default_tiers, TimeoutTier, TimeoutTiers};

/// Application configuration stored in config.json
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Daily budget for metered backends
    pub quota: QuotaSettings,
    /// Retrieval cache sizing
    pub cache: CacheSettings,
    /// Vector knowledge store
    pub knowledge: KnowledgeSettings,
    /// Model backends in priority order
    pub backends: Vec<BackendConfig>,
    /// Timeout tiers, shortest first
    pub tiers: Vec<TimeoutTier>,
    /// Quality gate bounds
    pub quality: QualityConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            quota: QuotaSettings::default(),
            cache: CacheSettings::default(),
            knowledge: KnowledgeSettings::default(),
            backends: vec![BackendConfig::local("ollama", "llama3.2")],
            tiers: default_tiers(),
            quality: QualityConfig::default(),
        }
    }
}

/// Quota settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaSettings {
    /// Metered calls allowed per UTC day
    pub daily_limit: u32,
    /// State file; defaults to ~/.prose-cascade/quota.json
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_path: Option<PathBuf>,
}

impl Default for QuotaSettings {
    fn default() -> Self {
        Self {
            daily_limit: DEFAULT_DAILY_LIMIT,
            state_path: None,
        }
    }
}

/// Response cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Maximum cached queries
    pub max_entries: u64,
    /// Entry lifetime in seconds
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_entries: 1_000,
            ttl_secs: 3_600,
        }
    }
}

/// Knowledge store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeSettings {
    /// Whether retrieval runs at all
    pub enabled: bool,
    /// HTTP vector store endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Collection queried on the HTTP store
    pub collection: String,
    /// JSON corpus for the in-memory store, used when no base_url is set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corpus_path: Option<PathBuf>,
    /// Passages requested per query
    pub top_k: usize,
    /// Passages scoring below this are dropped
    pub min_similarity: f32,
    /// Best-source similarity that earns high confidence
    pub strong_match_similarity: f32,
    /// Deadline for one store query
    pub timeout_ms: u64,
}

impl Default for KnowledgeSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: None,
            collection: "writing_guides".to_string(),
            corpus_path: None,
            top_k: 3,
            min_similarity: 0.3,
            strong_match_similarity: 0.6,
            timeout_ms: 3_000,
        }
    }
}

impl AppConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.cache.max_entries == 0 {
            return Err("cache.max_entries must be at least 1".to_string());
        }
        if self.cache.ttl_secs == 0 {
            return Err("cache.ttl_secs must be at least 1".to_string());
        }

        if self.knowledge.top_k == 0 {
            return Err("knowledge.top_k must be at least 1".to_string());
        }
        for (name, value) in [
            ("min_similarity", self.knowledge.min_similarity),
            ("strong_match_similarity", self.knowledge.strong_match_similarity),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("knowledge.{} must be within [0, 1]", name));
            }
        }
        if self.knowledge.timeout_ms == 0 {
            return Err("knowledge.timeout_ms must be at least 1".to_string());
        }
        if let Some(base_url) = &self.knowledge.base_url {
            url::Url::parse(base_url)
                .map_err(|e| format!("Invalid knowledge.base_url '{}': {}", base_url, e))?;
        }

        for backend in &self.backends {
            backend.validate()?;
        }
        let mut names: Vec<&str> = self.backends.iter().map(|b| b.name.as_str()).collect();
        names.sort_unstable();
        if names.windows(2).any(|w| w[0] == w[1]) {
            return Err("backend names must be unique".to_string());
        }

        TimeoutTiers::new(self.tiers.clone())?;
        self.quality.validate()?;
        Ok(())
    }

    /// Validated tier table.
    pub fn timeout_tiers(&self) -> Result<TimeoutTiers, String> {
        TimeoutTiers::new(self.tiers.clone())
    }
}
