//! Local Backend
//!
//! Ollama local inference through the ollama-rs SDK. No API key, no quota.

use std::time::Duration;

use async_trait::async_trait;
use ollama_rs::generation::chat::request::ChatMessageRequest;
use ollama_rs::generation::chat::ChatMessage;
use ollama_rs::models::ModelOptions;
use ollama_rs::Ollama;

use super::provider::ModelBackend;
use super::types::{BackendConfig, BackendKind, GenerateRequest, LlmError, LlmResult};

/// Default Ollama API endpoint
pub const OLLAMA_DEFAULT_URL: &str = "http://localhost:11434";

/// Local Ollama backend
pub struct LocalBackend {
    config: BackendConfig,
    client: Ollama,
}

impl LocalBackend {
    /// Create a new local backend with the given configuration
    pub fn new(config: BackendConfig) -> Self {
        let base_url = config.base_url.as_deref().unwrap_or(OLLAMA_DEFAULT_URL);
        let client = Self::create_client(base_url);
        Self { config, client }
    }

    /// Create an Ollama SDK client from a base URL string.
    ///
    /// `Ollama::new()` takes host and port separately.
    fn create_client(base_url: &str) -> Ollama {
        if let Ok(parsed) = url::Url::parse(base_url) {
            let scheme = parsed.scheme();
            let host = parsed.host_str().unwrap_or("localhost");
            let port = parsed.port().unwrap_or(11434);
            Ollama::new(format!("{}://{}", scheme, host), port)
        } else {
            tracing::warn!("Invalid Ollama URL '{}', using default", base_url);
            Ollama::default()
        }
    }

    fn base_url(&self) -> &str {
        self.config.base_url.as_deref().unwrap_or(OLLAMA_DEFAULT_URL)
    }

    fn build_chat_request(&self, request: &GenerateRequest) -> ChatMessageRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(ChatMessage::system(system.clone()));
        }
        messages.push(ChatMessage::user(request.prompt.clone()));

        let temperature = request
            .temperature_override
            .unwrap_or(self.config.temperature);
        let mut opts = ModelOptions::default().temperature(temperature);
        if self.config.max_tokens > 0 {
            opts = opts.num_predict(self.config.max_tokens as i32);
        }
        ChatMessageRequest::new(self.config.model.clone(), messages).options(opts)
    }

    fn map_error(&self, msg: String) -> LlmError {
        if msg.contains("connect") || msg.contains("Connection refused") {
            LlmError::ProviderUnavailable {
                message: format!("Cannot connect to Ollama at {}: {}", self.base_url(), msg),
            }
        } else if msg.contains("not found") || msg.contains("404") {
            LlmError::ProviderUnavailable {
                message: format!("Model '{}' not found: {}", self.config.model, msg),
            }
        } else {
            LlmError::Transport { message: msg }
        }
    }
}

#[async_trait]
impl ModelBackend for LocalBackend {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    async fn generate(&self, request: &GenerateRequest, timeout: Duration) -> LlmResult<String> {
        let chat = self.build_chat_request(request);

        let response = match tokio::time::timeout(timeout, self.client.send_chat_messages(chat))
            .await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(self.map_error(e.to_string())),
            Err(_) => {
                return Err(LlmError::Timeout {
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        };

        let content = response.message.content;
        if content.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(content)
    }
}
