//! Metered Backend
//!
//! Remote generation API billed per call. Every call is gated by the shared
//! `QuotaTracker`; quota signals from the remote force the budget to
//! exhausted for the rest of the day.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::http_client::build_http_client;
use super::provider::{body_signals_quota, map_reqwest_error, parse_http_error, ModelBackend};
use super::quota::QuotaTracker;
use super::types::{BackendConfig, BackendKind, GenerateRequest, LlmError, LlmResult};

/// Request body sent to the remote API.
#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

/// Response body returned by the remote API.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

/// Remote backend gated by the daily quota.
pub struct MeteredBackend {
    config: BackendConfig,
    endpoint: String,
    api_key: Option<String>,
    client: reqwest::Client,
    quota: Arc<QuotaTracker>,
}

impl MeteredBackend {
    /// Create a backend from configuration. The API key is read from the
    /// environment variable named by `api_key_env`.
    pub fn new(config: BackendConfig, quota: Arc<QuotaTracker>) -> LlmResult<Self> {
        let api_key = config
            .api_key_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|key| !key.trim().is_empty());
        Self::with_api_key(config, api_key, quota)
    }

    /// Create a backend with an explicit API key.
    pub fn with_api_key(
        config: BackendConfig,
        api_key: Option<String>,
        quota: Arc<QuotaTracker>,
    ) -> LlmResult<Self> {
        let base = config
            .base_url
            .as_deref()
            .ok_or_else(|| LlmError::ProviderUnavailable {
                message: format!("metered backend '{}' has no base_url", config.name),
            })?;
        let endpoint = url::Url::parse(base)
            .map_err(|e| LlmError::ProviderUnavailable {
                message: format!("invalid base_url '{}': {}", base, e),
            })?
            .to_string();
        let client = build_http_client(Duration::from_millis(config.connect_timeout_ms));

        Ok(Self {
            config,
            endpoint,
            api_key,
            client,
            quota,
        })
    }

    async fn send(&self, request: &GenerateRequest, timeout: Duration) -> LlmResult<String> {
        let body = GenerateBody {
            model: &self.config.model,
            prompt: &request.prompt,
            system: request.system.as_deref(),
            stream: false,
            options: GenerateOptions {
                temperature: request
                    .temperature_override
                    .unwrap_or(self.config.temperature),
                num_predict: self.config.max_tokens,
            },
        };

        let mut builder = self
            .client
            .post(&self.endpoint)
            .timeout(timeout)
            .json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, timeout))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| map_reqwest_error(e, timeout))?;

        if !status.is_success() {
            return Err(parse_http_error(status.as_u16(), &text, &self.config.name));
        }

        // Some APIs report quota exhaustion in a 200 body
        if body_signals_quota(&text) {
            return Err(parse_http_error(429, &text, &self.config.name));
        }

        let parsed: GenerateResponse =
            serde_json::from_str(&text).map_err(|e| LlmError::InvalidResponse {
                message: format!("{}: {}", self.config.name, e),
            })?;

        match parsed.response {
            Some(content) if !content.trim().is_empty() => Ok(content),
            _ => Err(LlmError::EmptyResponse),
        }
    }
}

#[async_trait]
impl ModelBackend for MeteredBackend {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Metered
    }

    async fn generate(&self, request: &GenerateRequest, timeout: Duration) -> LlmResult<String> {
        if !self.quota.try_acquire() {
            return Err(LlmError::QuotaExceeded {
                message: format!("{}: daily budget spent", self.config.name),
            });
        }

        let result = match tokio::time::timeout(timeout, self.send(request, timeout)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout {
                timeout_ms: timeout.as_millis() as u64,
            }),
        };

        if let Err(LlmError::QuotaExceeded { message }) = &result {
            tracing::warn!(backend = %self.config.name, "Remote quota signal: {}", message);
            self.quota.mark_exhausted();
        }
        result
    }
}
