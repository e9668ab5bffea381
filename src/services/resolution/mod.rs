//! Issue Resolution
//!
//! The fallback state machine and the strategies it runs: rule-based
//! rewrites, knowledge-grounded and plain model rewrites, and the emergency
//! generator.

pub mod deterministic;
pub mod emergency;
pub mod orchestrator;
pub mod patterns;
pub mod prompts;
pub mod state;
pub mod tiers;

pub use deterministic::DeterministicRewriter;
pub use emergency::{guidance_for, EmergencyGenerator};
pub use orchestrator::{Orchestrator, OrchestratorBuilder};
pub use state::{ResolutionLog, ResolutionState, TierAttempt, TransitionReason};
pub use tiers::{default_tiers, Complexity, TimeoutTier, TimeoutTiers};
