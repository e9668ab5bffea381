//! Services
//!
//! Business logic: knowledge retrieval and issue resolution.

pub mod knowledge;
pub mod resolution;

pub use knowledge::{KnowledgeRetriever, ResponseCache, VectorStore};
pub use resolution::{Orchestrator, OrchestratorBuilder, ResolutionLog};
