//! Resolution State Machine
//!
//! States, transition reasons and the per-resolution attempt log.

use std::time::Duration;

use prose_cascade_core::SuggestionMethod;
use prose_cascade_llm::LlmError;
use serde::{Deserialize, Serialize};

/// Stage of one resolution. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionState {
    /// Rule-based phrase rewrite, no network
    TryDeterministic,
    /// Retrieved guidance plus a model rewrite
    TryKnowledgeModel,
    /// Model rewrite without guidance
    TryModelOnly,
    /// Network-free pattern transform; cannot fail
    Emergency,
}

impl ResolutionState {
    /// The state after this one, or `None` for `Emergency`.
    pub fn next(self) -> Option<Self> {
        match self {
            ResolutionState::TryDeterministic => Some(ResolutionState::TryKnowledgeModel),
            ResolutionState::TryKnowledgeModel => Some(ResolutionState::TryModelOnly),
            ResolutionState::TryModelOnly => Some(ResolutionState::Emergency),
            ResolutionState::Emergency => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == ResolutionState::Emergency
    }
}

impl std::fmt::Display for ResolutionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionState::TryDeterministic => write!(f, "try_deterministic"),
            ResolutionState::TryKnowledgeModel => write!(f, "try_knowledge_model"),
            ResolutionState::TryModelOnly => write!(f, "try_model_only"),
            ResolutionState::Emergency => write!(f, "emergency"),
        }
    }
}

/// Why a state or backend attempt did not produce a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionReason {
    /// No rule or no knowledge applied
    NoMatch,
    /// Daily budget spent or remote rate limit
    QuotaExceeded,
    /// Deadline elapsed
    Timeout,
    /// Backend unreachable or failed at the wire level
    Transport,
    /// Output failed the quality gate
    QualityRejected,
    /// Caller cancelled the resolution
    Cancelled,
}

impl TransitionReason {
    /// Whether the backend should not be tried again in this resolution.
    pub fn excludes_backend(&self) -> bool {
        matches!(
            self,
            TransitionReason::QuotaExceeded | TransitionReason::Transport
        )
    }
}

impl From<&LlmError> for TransitionReason {
    fn from(err: &LlmError) -> Self {
        match err {
            LlmError::QuotaExceeded { .. } => TransitionReason::QuotaExceeded,
            LlmError::Timeout { .. } => TransitionReason::Timeout,
            LlmError::EmptyResponse => TransitionReason::QualityRejected,
            LlmError::Transport { .. }
            | LlmError::ProviderUnavailable { .. }
            | LlmError::Server { .. }
            | LlmError::AuthenticationFailed { .. }
            | LlmError::InvalidResponse { .. } => TransitionReason::Transport,
        }
    }
}

impl std::fmt::Display for TransitionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransitionReason::NoMatch => write!(f, "no_match"),
            TransitionReason::QuotaExceeded => write!(f, "quota_exceeded"),
            TransitionReason::Timeout => write!(f, "timeout"),
            TransitionReason::Transport => write!(f, "transport"),
            TransitionReason::QualityRejected => write!(f, "quality_rejected"),
            TransitionReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Record of a single attempt within a state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierAttempt {
    /// State the attempt ran in
    pub state: ResolutionState,
    /// Backend used, if any
    pub backend: Option<String>,
    /// Timeout tier used, if any
    pub tier: Option<String>,
    /// Whether this attempt produced the suggestion
    pub success: bool,
    /// Failure reason if failed
    pub reason: Option<TransitionReason>,
    /// Error or rejection detail
    pub detail: Option<String>,
    /// Duration of the attempt in milliseconds
    pub duration_ms: u64,
    /// Timestamp when attempt started
    pub started_at: String,
}

impl TierAttempt {
    /// Create a successful attempt record
    pub fn success(
        state: ResolutionState,
        backend: Option<&str>,
        tier: Option<&str>,
        duration: Duration,
    ) -> Self {
        Self {
            state,
            backend: backend.map(str::to_string),
            tier: tier.map(str::to_string),
            success: true,
            reason: None,
            detail: None,
            duration_ms: duration.as_millis() as u64,
            started_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Create a failed attempt record
    pub fn failure(
        state: ResolutionState,
        backend: Option<&str>,
        tier: Option<&str>,
        reason: TransitionReason,
        detail: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            state,
            backend: backend.map(str::to_string),
            tier: tier.map(str::to_string),
            success: false,
            reason: Some(reason),
            detail: Some(detail.into()),
            duration_ms: duration.as_millis() as u64,
            started_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Log of every attempt made while resolving one issue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionLog {
    /// Identifier carried in tracing spans
    pub resolution_id: String,
    /// All attempts made, in order
    pub attempts: Vec<TierAttempt>,
    /// Total duration in milliseconds
    pub total_duration_ms: u64,
    /// State that produced the suggestion
    pub final_state: Option<ResolutionState>,
    /// Method of the returned suggestion
    pub final_method: Option<SuggestionMethod>,
}

impl Default for ResolutionLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolutionLog {
    pub fn new() -> Self {
        Self {
            resolution_id: uuid::Uuid::new_v4().to_string(),
            attempts: Vec::new(),
            total_duration_ms: 0,
            final_state: None,
            final_method: None,
        }
    }

    /// Add an attempt to the log
    pub fn add_attempt(&mut self, attempt: TierAttempt) {
        self.attempts.push(attempt);
    }

    /// Close the log.
    pub fn finish(&mut self, state: ResolutionState, method: SuggestionMethod, total: Duration) {
        self.final_state = Some(state);
        self.final_method = Some(method);
        self.total_duration_ms = total.as_millis() as u64;
    }

    /// Get the number of failed attempts
    pub fn failed_attempts_count(&self) -> usize {
        self.attempts.iter().filter(|a| !a.success).count()
    }

    /// Distinct states visited, in order.
    pub fn states_visited(&self) -> Vec<ResolutionState> {
        let mut states: Vec<ResolutionState> = Vec::new();
        for attempt in &self.attempts {
            if states.last() != Some(&attempt.state) {
                states.push(attempt.state);
            }
        }
        states
    }

    /// Attempts made against one backend.
    pub fn attempts_for(&self, backend: &str) -> Vec<&TierAttempt> {
        self.attempts
            .iter()
            .filter(|a| a.backend.as_deref() == Some(backend))
            .collect()
    }
}
