//! Prose Cascade LLM
//!
//! Provides a unified interface for the model backends used by the
//! resolution cascade:
//! - Metered remote API (reqwest), gated by the daily quota
//! - Ollama (local inference)
//!
//! Also includes the quota tracker and the HTTP client factory.

pub mod http_client;
pub mod local;
pub mod metered;
pub mod provider;
pub mod quota;
pub mod types;

use std::sync::Arc;

// Re-export main types
pub use http_client::build_http_client;
pub use local::LocalBackend;
pub use metered::MeteredBackend;
pub use provider::ModelBackend;
pub use quota::{QuotaState, QuotaTracker, DEFAULT_DAILY_LIMIT};
pub use types::*;

/// Build a backend from its configuration.
///
/// Metered backends share `quota`; local backends ignore it.
pub fn create_backend(
    config: BackendConfig,
    quota: Arc<QuotaTracker>,
) -> LlmResult<Arc<dyn ModelBackend>> {
    match config.kind {
        BackendKind::Metered => Ok(Arc::new(MeteredBackend::new(config, quota)?)),
        BackendKind::Local => Ok(Arc::new(LocalBackend::new(config))),
    }
}
