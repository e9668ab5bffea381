//! Prose Cascade Quality Gates
//!
//! Validation of candidate rewrites before they are shown to the user:
//!
//! - `models` - Gate data types (GateStatus, CheckResult, GateVerdict, QualityConfig, etc.)
//! - `similarity` - Token-level diff similarity
//! - `grammar` - Grammar checker trait and heuristic implementation
//! - `artifacts` - Meta-commentary detection
//! - `gate` - The `QualityGate` combining all checks

pub mod artifacts;
pub mod gate;
pub mod grammar;
pub mod models;
pub mod similarity;

// Re-export core model types
pub use models::{
    CheckKind, CheckResult, GateStatus, GateVerdict, QualityConfig, RejectionReason,
    ValidationOptions,
};

// Re-export gate and checkers
pub use artifacts::{find_meta_commentary, has_meta_commentary};
pub use gate::QualityGate;
pub use grammar::{GrammarChecker, HeuristicGrammarChecker, NoopGrammarChecker};
pub use similarity::{normalize_tokens, surface_similarity, token_similarity};
