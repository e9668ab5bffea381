//! Backend Integration Tests
//!
//! The metered HTTP backend against a mock server, and orchestrators built
//! from configuration.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use prose_cascade::{AppConfig, Confidence, Issue, Orchestrator, SuggestionMethod};
use prose_cascade_core::SystemClock;
use prose_cascade_llm::{
    BackendConfig, GenerateRequest, LlmError, MeteredBackend, ModelBackend, QuotaTracker,
};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Helper Functions
// ============================================================================

fn tracker(limit: u32) -> Arc<QuotaTracker> {
    Arc::new(QuotaTracker::in_memory(limit, Arc::new(SystemClock)))
}

fn metered_config(server: &MockServer) -> BackendConfig {
    BackendConfig::metered("remote", format!("{}/api/generate", server.uri()), "rewrite-small")
}

fn request() -> GenerateRequest {
    GenerateRequest::new("Rewrite: The file was saved by the user.").with_system("You are an editor.")
}

async fn mount(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(response)
        .mount(server)
        .await;
}

// ============================================================================
// MeteredBackend
// ============================================================================

#[tokio::test]
async fn test_metered_success_counts_quota() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "rewrite-small",
            "stream": false,
            "system": "You are an editor."
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"response": "The user saved the file."})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let quota = tracker(5);
    let backend =
        MeteredBackend::with_api_key(metered_config(&server), Some("test-key".into()), quota.clone())
            .unwrap();

    let text = backend
        .generate(&request(), Duration::from_secs(2))
        .await
        .unwrap();

    assert_eq!(text, "The user saved the file.");
    assert_eq!(quota.status().usage_count, 1);
}

#[tokio::test]
async fn test_metered_429_marks_quota_exhausted() {
    let server = MockServer::start().await;
    mount(
        &server,
        ResponseTemplate::new(429).set_body_json(json!({
            "error": {"code": 429, "status": "RESOURCE_EXHAUSTED", "message": "Quota exceeded"}
        })),
    )
    .await;

    let quota = tracker(50);
    let backend = MeteredBackend::new(metered_config(&server), quota.clone()).unwrap();
    let err = backend
        .generate(&request(), Duration::from_secs(2))
        .await
        .unwrap_err();

    assert!(err.is_quota(), "got {:?}", err);
    assert!(!quota.can_proceed());
    assert_eq!(quota.status().usage_count, 50);
}

#[tokio::test]
async fn test_metered_quota_signal_in_ok_body() {
    let server = MockServer::start().await;
    mount(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({
            "error": {"type": "insufficient_quota", "message": "You exceeded your current quota"}
        })),
    )
    .await;

    let quota = tracker(50);
    let backend = MeteredBackend::new(metered_config(&server), quota.clone()).unwrap();
    let err = backend
        .generate(&request(), Duration::from_secs(2))
        .await
        .unwrap_err();

    assert!(err.is_quota());
    assert!(!quota.can_proceed());
}

#[tokio::test]
async fn test_metered_slow_response_times_out() {
    let server = MockServer::start().await;
    mount(
        &server,
        ResponseTemplate::new(200)
            .set_body_json(json!({"response": "late"}))
            .set_delay(Duration::from_millis(600)),
    )
    .await;

    let backend = MeteredBackend::new(metered_config(&server), tracker(5)).unwrap();
    let err = backend
        .generate(&request(), Duration::from_millis(100))
        .await
        .unwrap_err();

    assert!(err.is_timeout(), "got {:?}", err);
}

#[tokio::test]
async fn test_metered_server_error_is_transport() {
    let server = MockServer::start().await;
    mount(&server, ResponseTemplate::new(500).set_body_string("boom")).await;

    let quota = tracker(5);
    let backend = MeteredBackend::new(metered_config(&server), quota.clone()).unwrap();
    let err = backend
        .generate(&request(), Duration::from_secs(2))
        .await
        .unwrap_err();

    assert!(err.is_transport());
    assert!(!err.is_quota());
    assert!(quota.can_proceed());
}

#[tokio::test]
async fn test_metered_empty_response() {
    let server = MockServer::start().await;
    mount(&server, ResponseTemplate::new(200).set_body_json(json!({"response": "  "}))).await;

    let backend = MeteredBackend::new(metered_config(&server), tracker(5)).unwrap();
    let err = backend
        .generate(&request(), Duration::from_secs(2))
        .await
        .unwrap_err();

    assert_eq!(err, LlmError::EmptyResponse);
}

// ============================================================================
// Orchestrator from configuration
// ============================================================================

fn config_with(server: &MockServer) -> AppConfig {
    let mut config = AppConfig::default();
    config.backends = vec![metered_config(server)];
    config.knowledge.enabled = false;
    config
}

#[tokio::test]
async fn test_configured_orchestrator_uses_metered_backend() {
    let server = MockServer::start().await;
    mount(
        &server,
        ResponseTemplate::new(200)
            .set_body_json(json!({"response": "Rewritten sentence: The user saved the file."})),
    )
    .await;

    let quota = tracker(10);
    let orchestrator =
        Orchestrator::from_config_with_quota(&config_with(&server), quota.clone()).unwrap();
    let suggestion = orchestrator
        .resolve(&Issue::new("Avoid passive voice", "The file was saved by the user."))
        .await;

    assert_eq!(suggestion.method, SuggestionMethod::LlmOnly);
    assert_eq!(suggestion.text, "The user saved the file.");
    assert_eq!(orchestrator.quota_status().unwrap().usage_count, 1);
}

#[tokio::test]
async fn test_configured_orchestrator_quota_error_reaches_emergency() {
    let server = MockServer::start().await;
    mount(
        &server,
        ResponseTemplate::new(429).set_body_string("rate limited"),
    )
    .await;

    let quota = tracker(10);
    let orchestrator =
        Orchestrator::from_config_with_quota(&config_with(&server), quota.clone()).unwrap();
    let suggestion = orchestrator
        .resolve(&Issue::new("Avoid passive voice", "The file was saved by the user."))
        .await;

    assert_eq!(suggestion.method, SuggestionMethod::Emergency);
    assert_eq!(suggestion.text, "The user saved the file.");
    assert!(!quota.can_proceed());
}

#[tokio::test]
async fn test_configured_orchestrator_with_corpus() {
    let temp = TempDir::new().unwrap();
    let corpus = temp.path().join("guides.json");
    fs::write(
        &corpus,
        json!([
            {
                "document": "Passive voice hides the actor; prefer active voice.",
                "metadata": {"rule_id": "active-voice", "title": "Active voice"}
            },
            {
                "document": "Spell out numbers below ten.",
                "metadata": {"rule_id": "numbers"}
            }
        ])
        .to_string(),
    )
    .unwrap();

    let server = MockServer::start().await;
    mount(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({"response": "The user saved the file."})),
    )
    .await;

    let mut config = config_with(&server);
    config.knowledge.enabled = true;
    config.knowledge.corpus_path = Some(corpus);

    let orchestrator = Orchestrator::from_config_with_quota(&config, tracker(10)).unwrap();
    let suggestion = orchestrator
        .resolve(&Issue::new("Avoid passive voice", "The file was saved by the user."))
        .await;

    assert_eq!(suggestion.method, SuggestionMethod::KnowledgeLlm);
    assert_eq!(suggestion.confidence, Confidence::High);
    assert_eq!(suggestion.sources.len(), 1);
    assert_eq!(suggestion.sources[0].rule_id, "active-voice");
}

#[test]
fn test_invalid_config_is_rejected() {
    let mut config = AppConfig::default();
    config.tiers.reverse();
    assert!(Orchestrator::from_config_with_quota(&config, tracker(10)).is_err());
}
