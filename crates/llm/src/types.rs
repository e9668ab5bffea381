//! LLM Types
//!
//! Core types for model backend interactions.

use serde::{Deserialize, Serialize};

/// Kind of model backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Remote API billed per call and gated by the daily quota
    Metered,
    /// Local inference service (Ollama), no quota semantics
    Local,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Metered => write!(f, "metered"),
            BackendKind::Local => write!(f, "local"),
        }
    }
}

/// Configuration for a model backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Name used in logs and resolution traces
    pub name: String,
    /// Backend kind
    pub kind: BackendKind,
    /// Base URL override (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Model name to use
    pub model: String,
    /// Environment variable holding the API key (metered backends)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Temperature (0.0 - 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Connect timeout in milliseconds
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

fn default_max_tokens() -> u32 {
    256
}

fn default_temperature() -> f32 {
    0.3
}

fn default_connect_timeout_ms() -> u64 {
    2_000
}

impl BackendConfig {
    /// Local Ollama backend with default settings.
    pub fn local(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: BackendKind::Local,
            base_url: None,
            model: model.into(),
            api_key_env: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }

    /// Metered remote backend with default settings.
    pub fn metered(
        name: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: BackendKind::Metered,
            base_url: Some(base_url.into()),
            model: model.into(),
            api_key_env: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("backend name must not be empty".to_string());
        }
        if self.model.trim().is_empty() {
            return Err(format!("backend '{}' has no model", self.name));
        }
        if self.kind == BackendKind::Metered && self.base_url.is_none() {
            return Err(format!("metered backend '{}' needs a base_url", self.name));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!(
                "backend '{}' temperature {} out of range",
                self.name, self.temperature
            ));
        }
        Ok(())
    }
}

/// A generation request sent to a backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// User prompt
    pub prompt: String,
    /// Optional system prompt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Optional temperature override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_override: Option<f32>,
}

impl GenerateRequest {
    /// Create a request with just a prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system: None,
            temperature_override: None,
        }
    }

    /// Attach a system prompt.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Error types for backend operations.
///
/// Backends must classify failures into these variants; callers never parse
/// error messages to decide what happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LlmError {
    /// Daily budget spent, or the remote reported quota/rate exhaustion
    QuotaExceeded { message: String },
    /// The call did not finish within its deadline
    Timeout { timeout_ms: u64 },
    /// Network/connection error
    Transport { message: String },
    /// Backend not reachable or not running (e.g. Ollama not started)
    ProviderUnavailable { message: String },
    /// Server error from the backend
    Server {
        message: String,
        status: Option<u16>,
    },
    /// Authentication failed (invalid API key)
    AuthenticationFailed { message: String },
    /// Response could not be parsed
    InvalidResponse { message: String },
    /// Response parsed but carried no text
    EmptyResponse,
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmError::QuotaExceeded { message } => write!(f, "Quota exceeded: {}", message),
            LlmError::Timeout { timeout_ms } => write!(f, "Timed out after {}ms", timeout_ms),
            LlmError::Transport { message } => write!(f, "Transport error: {}", message),
            LlmError::ProviderUnavailable { message } => {
                write!(f, "Provider unavailable: {}", message)
            }
            LlmError::Server { message, status } => {
                if let Some(s) = status {
                    write!(f, "Server error ({}): {}", s, message)
                } else {
                    write!(f, "Server error: {}", message)
                }
            }
            LlmError::AuthenticationFailed { message } => {
                write!(f, "Authentication failed: {}", message)
            }
            LlmError::InvalidResponse { message } => write!(f, "Invalid response: {}", message),
            LlmError::EmptyResponse => write!(f, "Empty response"),
        }
    }
}

impl std::error::Error for LlmError {}

impl LlmError {
    /// Whether the backend could not be reached or failed at the wire level.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            LlmError::Transport { .. }
                | LlmError::ProviderUnavailable { .. }
                | LlmError::Server { .. }
                | LlmError::AuthenticationFailed { .. }
        )
    }

    /// Whether the failure was a quota/rate-limit signal.
    pub fn is_quota(&self) -> bool {
        matches!(self, LlmError::QuotaExceeded { .. })
    }

    /// Whether the call ran out of time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, LlmError::Timeout { .. })
    }
}

/// Result type for backend operations
pub type LlmResult<T> = Result<T, LlmError>;
