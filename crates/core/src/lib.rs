//! Prose Cascade Core
//!
//! Foundational data model and error types for the Prose Cascade workspace.
//! This crate has zero dependencies on backend code (HTTP clients, model
//! runtimes, caches).
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `issue` - Resolution input (`Issue`, `IssueType`)
//! - `suggestion` - Resolution output (`Suggestion`, `SuggestionMethod`, `Confidence`, `SourceRef`)
//! - `knowledge` - Retrieved guidance passages (`KnowledgeChunk`)
//! - `clock` - Injectable wall clock (`Clock`, `SystemClock`, `FixedClock`)

pub mod clock;
pub mod error;
pub mod issue;
pub mod knowledge;
pub mod suggestion;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Data Model ─────────────────────────────────────────────────────────
pub use issue::{Issue, IssueType, DEFAULT_DOCUMENT_TYPE};
pub use knowledge::{KnowledgeChunk, META_RULE_ID, META_TITLE};
pub use suggestion::{Confidence, SourceRef, Suggestion, SuggestionMethod};

// ── Clock ──────────────────────────────────────────────────────────────
pub use clock::{Clock, FixedClock, SystemClock};
