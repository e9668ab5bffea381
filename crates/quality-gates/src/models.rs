//! Quality Gate Models
//!
//! Data structures for suggestion validation: gate configuration, per-check
//! outcomes, rejection reasons and the overall verdict.

use serde::{Deserialize, Serialize};

/// Outcome of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateStatus {
    /// Check passed
    Passed,
    /// Check failed; the candidate is rejected
    Failed,
    /// Check could not run (e.g., no grammar checker available)
    Skipped,
}

impl GateStatus {
    /// Check if this status indicates success
    pub fn is_success(&self) -> bool {
        matches!(self, GateStatus::Passed | GateStatus::Skipped)
    }

    /// Check if this status indicates failure
    pub fn is_failure(&self) -> bool {
        matches!(self, GateStatus::Failed)
    }
}

impl std::fmt::Display for GateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateStatus::Passed => write!(f, "passed"),
            GateStatus::Failed => write!(f, "failed"),
            GateStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// The individual checks a candidate goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    /// Candidate must contain non-whitespace text
    NonEmpty,
    /// Candidate must differ from, but stay close to, the original
    Similarity,
    /// Candidate must not introduce grammar problems
    Grammar,
    /// Candidate must not contain model chatter
    MetaCommentary,
}

impl std::fmt::Display for CheckKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckKind::NonEmpty => write!(f, "non_empty"),
            CheckKind::Similarity => write!(f, "similarity"),
            CheckKind::Grammar => write!(f, "grammar"),
            CheckKind::MetaCommentary => write!(f, "meta_commentary"),
        }
    }
}

/// Why a candidate was rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectionReason {
    /// Empty or whitespace-only output
    Empty,
    /// Output is (nearly) the original sentence
    TooSimilar { similarity: f64 },
    /// Output drifted too far from the original meaning
    TooDifferent { similarity: f64 },
    /// Output has more grammar issues than the original
    GrammarRegression { original: usize, candidate: usize },
    /// Output did not fix any of the original's grammar issues
    NoGrammarImprovement { original: usize, candidate: usize },
    /// Output contains commentary about the rewrite
    MetaCommentary { fragment: String },
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectionReason::Empty => write!(f, "empty output"),
            RejectionReason::TooSimilar { similarity } => {
                write!(f, "too similar to original ({:.2})", similarity)
            }
            RejectionReason::TooDifferent { similarity } => {
                write!(f, "too different from original ({:.2})", similarity)
            }
            RejectionReason::GrammarRegression {
                original,
                candidate,
            } => write!(
                f,
                "grammar regressed ({} -> {} issues)",
                original, candidate
            ),
            RejectionReason::NoGrammarImprovement {
                original,
                candidate,
            } => write!(
                f,
                "grammar not improved ({} -> {} issues)",
                original, candidate
            ),
            RejectionReason::MetaCommentary { fragment } => {
                write!(f, "meta-commentary: \"{}\"", fragment)
            }
        }
    }
}

/// Result of one check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    /// Which check ran
    pub check: CheckKind,
    /// Outcome
    pub status: GateStatus,
    /// Rejection reason when failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectionReason>,
}

impl CheckResult {
    /// Create a passed result.
    pub fn passed(check: CheckKind) -> Self {
        Self {
            check,
            status: GateStatus::Passed,
            reason: None,
        }
    }

    /// Create a failed result.
    pub fn failed(check: CheckKind, reason: RejectionReason) -> Self {
        Self {
            check,
            status: GateStatus::Failed,
            reason: Some(reason),
        }
    }

    /// Create a skipped result.
    pub fn skipped(check: CheckKind) -> Self {
        Self {
            check,
            status: GateStatus::Skipped,
            reason: None,
        }
    }
}

/// Verdict on a candidate suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateVerdict {
    /// The candidate text as validated (trimmed)
    pub candidate: String,
    /// Token-level similarity to the original, when computed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
    /// Per-check outcomes, in evaluation order
    pub checks: Vec<CheckResult>,
}

impl GateVerdict {
    /// Whether every check passed or was skipped.
    pub fn is_accepted(&self) -> bool {
        self.checks.iter().all(|c| c.status.is_success())
    }

    /// The accepted text, or `None` when any check failed.
    pub fn accepted(self) -> Option<String> {
        if self.is_accepted() {
            Some(self.candidate)
        } else {
            None
        }
    }

    /// Reasons for rejection (empty when accepted).
    pub fn rejection_reasons(&self) -> Vec<&RejectionReason> {
        self.checks.iter().filter_map(|c| c.reason.as_ref()).collect()
    }

    /// Outcome of a specific check, if it ran.
    pub fn status_of(&self, check: CheckKind) -> Option<GateStatus> {
        self.checks
            .iter()
            .find(|c| c.check == check)
            .map(|c| c.status)
    }

    /// One-line summary for logs.
    pub fn summary(&self) -> String {
        if self.is_accepted() {
            return "accepted".to_string();
        }
        let reasons: Vec<String> = self
            .rejection_reasons()
            .iter()
            .map(|r| r.to_string())
            .collect();
        format!("rejected: {}", reasons.join("; "))
    }
}

/// Gate configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Below this similarity the candidate has lost the original meaning
    pub min_similarity: f64,
    /// At or above this similarity the candidate is effectively unchanged
    pub max_similarity: f64,
    /// Whether meta-commentary rejects the candidate
    pub reject_meta_commentary: bool,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            min_similarity: 0.2,
            max_similarity: 0.95,
            reject_meta_commentary: true,
        }
    }
}

impl QualityConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.min_similarity)
            || !(0.0..=1.0).contains(&self.max_similarity)
        {
            return Err("similarity bounds must be within [0, 1]".to_string());
        }
        if self.min_similarity >= self.max_similarity {
            return Err(format!(
                "min_similarity ({}) must be below max_similarity ({})",
                self.min_similarity, self.max_similarity
            ));
        }
        Ok(())
    }
}

/// Per-call adjustments to the gate.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ValidationOptions {
    /// Overrides `QualityConfig::max_similarity` for this call
    pub max_similarity: Option<f64>,
}

impl ValidationOptions {
    /// Only reject candidates identical to the original.
    ///
    /// Used for rule-based rewrites, which often change a single phrase.
    pub fn relaxed() -> Self {
        Self {
            max_similarity: Some(1.0),
        }
    }
}
