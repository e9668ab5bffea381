//! Prose Cascade
//!
//! Resolves writing-style issues into concrete rewrite suggestions through a
//! chain of strategies:
//! - Rule-based rewrites for mechanical issues
//! - Model rewrites grounded in retrieved style guidance
//! - Plain model rewrites
//! - A pattern-based emergency generator that never fails
//!
//! Metered model calls are capped by a persisted daily quota, and every
//! model output passes a quality gate before it is returned.

pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

pub use models::settings::AppConfig;
pub use prose_cascade_core::{
    Confidence, Issue, IssueType, KnowledgeChunk, SourceRef, Suggestion, SuggestionMethod,
};
pub use services::resolution::{Orchestrator, OrchestratorBuilder, ResolutionLog};
pub use storage::ConfigService;
pub use utils::error::{AppError, AppResult};
