//! Model Backend Trait
//!
//! Defines the common interface for all model backends.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::types::{BackendKind, GenerateRequest, LlmError, LlmResult};

/// Trait that all model backends must implement.
///
/// The orchestrator selects among configured backends in priority order and
/// treats them interchangeably behind this interface.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Returns the backend name for identification.
    fn name(&self) -> &str;

    /// Returns the model being used.
    fn model(&self) -> &str;

    /// Returns the backend kind.
    fn kind(&self) -> BackendKind;

    /// Turn a prompt into raw text within `timeout`.
    ///
    /// Implementations must return `LlmError::Timeout` when the deadline
    /// elapses and `LlmError::QuotaExceeded` for quota/rate-limit signals.
    async fn generate(&self, request: &GenerateRequest, timeout: Duration) -> LlmResult<String>;
}

/// Structured error envelope returned by remote model APIs.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    code: Option<serde_json::Value>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default, rename = "type")]
    error_type: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ErrorDetail {
    fn signals_quota(&self) -> bool {
        let code_is_429 = match &self.code {
            Some(serde_json::Value::Number(n)) => n.as_u64() == Some(429),
            Some(serde_json::Value::String(s)) => {
                s == "429" || s == "quota_exceeded" || s == "rate_limit_exceeded"
            }
            _ => false,
        };
        let status_exhausted = self.status.as_deref() == Some("RESOURCE_EXHAUSTED");
        let type_quota = matches!(
            self.error_type.as_deref(),
            Some("quota_exceeded") | Some("insufficient_quota") | Some("rate_limit_exceeded")
        );
        code_is_429 || status_exhausted || type_quota
    }
}

/// Extract the error message from a structured error body, if there is one.
fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error)
        .and_then(|d| d.message)
}

/// Whether a response body carries a structured quota/rate-limit error.
pub fn body_signals_quota(body: &str) -> bool {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error)
        .map(|d| d.signals_quota())
        .unwrap_or(false)
}

/// Helper function to parse HTTP error status codes
pub fn parse_http_error(status: u16, body: &str, backend: &str) -> LlmError {
    let message = error_message(body).unwrap_or_else(|| body.to_string());

    if status == 429 || body_signals_quota(body) {
        return LlmError::QuotaExceeded {
            message: format!("{}: {}", backend, message),
        };
    }

    match status {
        401 => LlmError::AuthenticationFailed {
            message: format!("{}: Invalid API key", backend),
        },
        403 => LlmError::AuthenticationFailed {
            message: format!("{}: Access denied", backend),
        },
        404 => LlmError::ProviderUnavailable {
            message: format!("{}: endpoint or model not found: {}", backend, message),
        },
        _ => LlmError::Server {
            message: format!("{}: {}", backend, message),
            status: Some(status),
        },
    }
}

/// Map a reqwest transport failure to `LlmError`.
pub fn map_reqwest_error(err: reqwest::Error, timeout: Duration) -> LlmError {
    if err.is_timeout() {
        LlmError::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        }
    } else if err.is_connect() {
        LlmError::ProviderUnavailable {
            message: err.to_string(),
        }
    } else if err.is_decode() {
        LlmError::InvalidResponse {
            message: err.to_string(),
        }
    } else {
        LlmError::Transport {
            message: err.to_string(),
        }
    }
}
