//! Resolution Integration Tests
//!
//! End-to-end runs of the orchestrator state machine with scripted backends.

use std::sync::Arc;
use std::time::{Duration, Instant};

use prose_cascade::services::knowledge::{KnowledgeRetriever, ResponseCache};
use prose_cascade::services::resolution::{
    ResolutionState, TimeoutTier, TimeoutTiers, TransitionReason,
};
use prose_cascade::{Confidence, Issue, IssueType, KnowledgeChunk, Orchestrator, SuggestionMethod};
use prose_cascade_core::{SystemClock, META_RULE_ID};
use prose_cascade_llm::{BackendKind, LlmError, QuotaTracker};
use tokio_util::sync::CancellationToken;

use crate::support::{transport_error, FixedStore, ScriptedBackend, Step};

// ============================================================================
// Helper Functions
// ============================================================================

const PASSIVE: &str = "The file was saved by the user.";
const ACTIVE: &str = "The user saved the file.";

fn passive_issue() -> Issue {
    Issue::new("Avoid passive voice", PASSIVE)
}

fn short_tiers() -> TimeoutTiers {
    TimeoutTiers::new(vec![
        TimeoutTier::new("quick", 50),
        TimeoutTier::new("standard", 500),
        TimeoutTier::new("extended", 1_000),
    ])
    .unwrap()
}

fn retriever_with(chunks: Vec<KnowledgeChunk>) -> (Arc<KnowledgeRetriever>, Arc<FixedStore>) {
    let store = FixedStore::new(chunks);
    let retriever = KnowledgeRetriever::new(
        store.clone(),
        Arc::new(ResponseCache::default()),
        0.0,
        Duration::from_secs(1),
    );
    (Arc::new(retriever), store)
}

// ============================================================================
// Deterministic tier
// ============================================================================

#[tokio::test]
async fn test_wordiness_resolved_by_rules() {
    let backend = ScriptedBackend::new("local", vec![Step::Reply(ACTIVE)]);
    let orchestrator = Orchestrator::builder().backend(backend.clone()).build();
    let issue = Issue::new("Wordy phrase", "In order to start the service, run the script.")
        .with_issue_type(IssueType::Wordiness);

    let (suggestion, log) = orchestrator.resolve_with_log(&issue).await;

    assert_eq!(suggestion.method, SuggestionMethod::Deterministic);
    assert_eq!(suggestion.confidence, Confidence::High);
    assert_eq!(suggestion.text, "To start the service, run the script.");
    assert!(suggestion.success);
    assert_eq!(log.states_visited(), vec![ResolutionState::TryDeterministic]);
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_capitalization_resolved_by_rules() {
    let backend = ScriptedBackend::new("local", vec![Step::Reply("Yesterday I said I'm ready.")]);
    let orchestrator = Orchestrator::builder().backend(backend.clone()).build();
    let issue = Issue::new("Capitalize the sentence start", "yesterday i said i'm ready.")
        .with_issue_type(IssueType::Capitalization);

    let (suggestion, log) = orchestrator.resolve_with_log(&issue).await;

    assert_eq!(suggestion.method, SuggestionMethod::Deterministic);
    assert_eq!(suggestion.text, "Yesterday I said I'm ready.");
    assert!(suggestion.success);
    assert_eq!(log.states_visited(), vec![ResolutionState::TryDeterministic]);
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_unhandled_issue_type_logs_no_rules() {
    let orchestrator = Orchestrator::builder().build();

    let (_, log) = orchestrator.resolve_with_log(&passive_issue()).await;

    let first = &log.attempts[0];
    assert_eq!(first.state, ResolutionState::TryDeterministic);
    assert_eq!(first.reason, Some(TransitionReason::NoMatch));
    assert_eq!(first.detail.as_deref(), Some("no rules for this issue type"));
}

#[tokio::test]
async fn test_rewrite_keeping_grammar_fault_is_rejected() {
    let sentence = "This is a example of the problem in the report.";
    let backend = ScriptedBackend::new(
        "local",
        vec![
            Step::Reply("This is a example of a problem in this report."),
            Step::Reply("This is an example of the problem in the report."),
        ],
    );
    let second = ScriptedBackend::new(
        "second",
        vec![Step::Reply("This is an example of the problem in the report.")],
    );
    let orchestrator = Orchestrator::builder()
        .backend(backend.clone())
        .backend(second.clone())
        .build();
    let issue = Issue::new("Vague wording", sentence).with_issue_type(IssueType::VagueLanguage);

    let (suggestion, log) = orchestrator.resolve_with_log(&issue).await;

    assert_eq!(suggestion.method, SuggestionMethod::LlmOnly);
    assert_eq!(suggestion.text, "This is an example of the problem in the report.");
    let rejected = &log.attempts_for("local")[0];
    assert_eq!(rejected.reason, Some(TransitionReason::QualityRejected));
    assert!(rejected.detail.as_deref().unwrap_or("").contains("grammar"));
    assert_eq!(second.calls(), 1);
}

#[tokio::test]
async fn test_resolve_feedback_classifies_and_expands_contractions() {
    let orchestrator = Orchestrator::builder().build();
    let suggestion = orchestrator
        .resolve_feedback(
            "Avoid contractions in formal writing",
            "We don't ship on Fridays.",
            Some("technical"),
            &["formal".to_string()],
        )
        .await;

    assert_eq!(suggestion.method, SuggestionMethod::Deterministic);
    assert_eq!(suggestion.text, "We do not ship on Fridays.");
}

// ============================================================================
// Model tiers
// ============================================================================

#[tokio::test]
async fn test_knowledge_tier_with_strong_source() {
    let (retriever, _) = retriever_with(vec![KnowledgeChunk::new(
        "Use active voice so the actor leads the sentence.",
        0.9,
    )
    .with_meta(META_RULE_ID, "active-voice")]);
    let backend = ScriptedBackend::new("local", vec![Step::Reply(ACTIVE)]);
    let orchestrator = Orchestrator::builder()
        .backend(backend.clone())
        .retriever(retriever)
        .build();

    let suggestion = orchestrator.resolve(&passive_issue()).await;

    assert_eq!(suggestion.method, SuggestionMethod::KnowledgeLlm);
    assert_eq!(suggestion.confidence, Confidence::High);
    assert_eq!(suggestion.text, ACTIVE);
    assert_eq!(suggestion.sources.len(), 1);
    assert_eq!(suggestion.sources[0].rule_id, "active-voice");
    assert!(backend.prompts()[0].contains("Use active voice"));
}

#[tokio::test]
async fn test_knowledge_tier_with_weak_source_is_medium() {
    let (retriever, _) = retriever_with(vec![KnowledgeChunk::new(
        "Active constructions read faster.",
        0.4,
    )]);
    let backend = ScriptedBackend::new("local", vec![Step::Reply(ACTIVE)]);
    let orchestrator = Orchestrator::builder()
        .backend(backend)
        .retriever(retriever)
        .build();

    let suggestion = orchestrator.resolve(&passive_issue()).await;

    assert_eq!(suggestion.method, SuggestionMethod::KnowledgeLlm);
    assert_eq!(suggestion.confidence, Confidence::Medium);
}

#[tokio::test]
async fn test_model_only_when_no_guidance() {
    let backend = ScriptedBackend::new("local", vec![Step::Reply("Sure! The user saved the file.")]);
    let fallback = ScriptedBackend::new("second", vec![Step::Reply(ACTIVE)]);
    let orchestrator = Orchestrator::builder()
        .backend(backend.clone())
        .backend(fallback.clone())
        .build();

    let (suggestion, log) = orchestrator.resolve_with_log(&passive_issue()).await;

    assert_eq!(suggestion.method, SuggestionMethod::LlmOnly);
    assert_eq!(suggestion.confidence, Confidence::Medium);
    assert_eq!(suggestion.text, ACTIVE);
    assert_eq!(backend.calls(), 1);
    assert_eq!(fallback.calls(), 1);
    assert_eq!(
        log.attempts_for("local")[0].reason,
        Some(TransitionReason::QualityRejected)
    );
}

#[tokio::test]
async fn test_quality_rejected_backend_is_retried_in_model_only() {
    let (retriever, _) = retriever_with(vec![KnowledgeChunk::new("Prefer active voice.", 0.8)]);
    let backend = ScriptedBackend::new("local", vec![Step::Reply(PASSIVE), Step::Reply(ACTIVE)]);
    let orchestrator = Orchestrator::builder()
        .backend(backend.clone())
        .retriever(retriever)
        .build();

    let (suggestion, log) = orchestrator.resolve_with_log(&passive_issue()).await;

    assert_eq!(suggestion.method, SuggestionMethod::LlmOnly);
    assert_eq!(suggestion.text, ACTIVE);
    let attempts = log.attempts_for("local");
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0].state, ResolutionState::TryKnowledgeModel);
    assert_eq!(attempts[0].reason, Some(TransitionReason::QualityRejected));
    assert_eq!(attempts[1].state, ResolutionState::TryModelOnly);
    assert!(attempts[1].success);
}

#[tokio::test]
async fn test_transport_failure_excludes_backend() {
    let (retriever, _) = retriever_with(vec![KnowledgeChunk::new("Prefer active voice.", 0.8)]);
    let backend = ScriptedBackend::new("local", vec![Step::Fail(transport_error())]);
    let orchestrator = Orchestrator::builder()
        .backend(backend.clone())
        .retriever(retriever)
        .build();

    let (suggestion, log) = orchestrator.resolve_with_log(&passive_issue()).await;

    assert_eq!(suggestion.method, SuggestionMethod::Emergency);
    assert_eq!(backend.calls(), 1);
    assert_eq!(log.final_state, Some(ResolutionState::Emergency));
}

// ============================================================================
// Timeout tiers
// ============================================================================

#[tokio::test]
async fn test_quick_tier_timeout_escalates_to_standard() {
    let backend = ScriptedBackend::new("local", vec![Step::Hang, Step::Reply("The meeting ran long.")]);
    let orchestrator = Orchestrator::builder()
        .backend(backend.clone())
        .tiers(short_tiers())
        .build();
    let issue = Issue::new("Wordy", "The meeting ran long today.").with_issue_type(IssueType::Wordiness);

    let (suggestion, log) = orchestrator.resolve_with_log(&issue).await;

    assert_eq!(suggestion.method, SuggestionMethod::LlmOnly);
    assert_eq!(suggestion.text, "The meeting ran long.");
    assert_eq!(
        backend.timeouts(),
        vec![Duration::from_millis(50), Duration::from_millis(500)]
    );
    let attempts = log.attempts_for("local");
    assert_eq!(attempts[0].reason, Some(TransitionReason::Timeout));
    assert_eq!(attempts[0].tier.as_deref(), Some("quick"));
    assert_eq!(attempts[1].tier.as_deref(), Some("standard"));
    assert!(attempts[1].success);
}

#[tokio::test]
async fn test_complex_issue_starts_at_longer_tier() {
    let simple_backend = ScriptedBackend::new("local", vec![Step::Reply("The meeting ran long.")]);
    let simple = Orchestrator::builder()
        .backend(simple_backend.clone())
        .tiers(short_tiers())
        .build();
    simple
        .resolve(&Issue::new("Wordy", "The meeting ran long today.").with_issue_type(IssueType::Wordiness))
        .await;

    let complex_backend = ScriptedBackend::new("local", vec![Step::Reply(ACTIVE)]);
    let complex = Orchestrator::builder()
        .backend(complex_backend.clone())
        .tiers(short_tiers())
        .build();
    complex.resolve(&passive_issue()).await;

    assert!(complex_backend.timeouts()[0] > simple_backend.timeouts()[0]);
    assert_eq!(complex_backend.timeouts()[0], Duration::from_millis(500));
}

#[tokio::test]
async fn test_passive_voice_timeout_escalates_to_extended() {
    let (retriever, _) = retriever_with(vec![KnowledgeChunk::new("Prefer active voice.", 0.8)]);
    let backend = ScriptedBackend::new("local", vec![Step::Hang, Step::Reply(ACTIVE)]);
    let orchestrator = Orchestrator::builder()
        .backend(backend.clone())
        .retriever(retriever)
        .tiers(short_tiers())
        .build();

    let (suggestion, log) = orchestrator.resolve_with_log(&passive_issue()).await;

    assert_eq!(suggestion.method, SuggestionMethod::KnowledgeLlm);
    assert_eq!(suggestion.text, ACTIVE);
    assert_eq!(
        backend.timeouts(),
        vec![Duration::from_millis(500), Duration::from_millis(1_000)]
    );
    let attempts = log.attempts_for("local");
    assert_eq!(attempts[0].tier.as_deref(), Some("standard"));
    assert_eq!(attempts[0].reason, Some(TransitionReason::Timeout));
    assert_eq!(attempts[1].tier.as_deref(), Some("extended"));
    assert!(attempts[1].success);
}

#[tokio::test]
async fn test_top_tier_timeout_falls_to_emergency() {
    let (retriever, _) = retriever_with(vec![KnowledgeChunk::new("Prefer active voice.", 0.8)]);
    let backend = ScriptedBackend::new("local", vec![Step::Hang]);
    let orchestrator = Orchestrator::builder()
        .backend(backend.clone())
        .retriever(retriever)
        .tiers(short_tiers())
        .build();

    let (suggestion, log) = orchestrator.resolve_with_log(&passive_issue()).await;

    assert_eq!(suggestion.method, SuggestionMethod::Emergency);
    assert_eq!(suggestion.text, ACTIVE);
    // Both remaining tiers are tried before the backend is excluded
    assert_eq!(
        backend.timeouts(),
        vec![Duration::from_millis(500), Duration::from_millis(1_000)]
    );
    let attempts = log.attempts_for("local");
    assert_eq!(attempts.len(), 2);
    assert!(attempts
        .iter()
        .all(|a| a.reason == Some(TransitionReason::Timeout)));
    assert_eq!(attempts[1].tier.as_deref(), Some("extended"));
}

// ============================================================================
// Quota
// ============================================================================

#[tokio::test]
async fn test_exhausted_metered_backend_is_skipped() {
    let quota = Arc::new(QuotaTracker::in_memory(1, Arc::new(SystemClock)));
    quota.record_use();
    let metered = ScriptedBackend::with_kind("remote", BackendKind::Metered, vec![Step::Reply(ACTIVE)]);
    let local = ScriptedBackend::new("local", vec![Step::Reply(ACTIVE)]);
    let orchestrator = Orchestrator::builder()
        .backend(metered.clone())
        .backend(local.clone())
        .quota(quota)
        .build();

    let (suggestion, log) = orchestrator.resolve_with_log(&passive_issue()).await;

    assert_eq!(suggestion.method, SuggestionMethod::LlmOnly);
    assert_eq!(metered.calls(), 0);
    assert_eq!(local.calls(), 1);
    assert_eq!(
        log.attempts_for("remote")[0].reason,
        Some(TransitionReason::QuotaExceeded)
    );
}

#[tokio::test]
async fn test_quota_error_excludes_backend_for_rest_of_resolution() {
    let (retriever, _) = retriever_with(vec![KnowledgeChunk::new("Prefer active voice.", 0.8)]);
    let backend = ScriptedBackend::new(
        "remote",
        vec![Step::Fail(LlmError::QuotaExceeded {
            message: "429".to_string(),
        })],
    );
    let orchestrator = Orchestrator::builder()
        .backend(backend.clone())
        .retriever(retriever)
        .build();

    let suggestion = orchestrator.resolve(&passive_issue()).await;

    assert_eq!(suggestion.method, SuggestionMethod::Emergency);
    assert_eq!(backend.calls(), 1);
}

// ============================================================================
// Emergency and guarantees
// ============================================================================

#[tokio::test]
async fn test_passive_voice_with_all_backends_failing() {
    let first = ScriptedBackend::new("first", vec![Step::Fail(transport_error())]);
    let second = ScriptedBackend::new("second", vec![Step::Fail(transport_error())]);
    let orchestrator = Orchestrator::builder().backend(first).backend(second).build();

    let (suggestion, log) = orchestrator.resolve_with_log(&passive_issue()).await;

    assert_eq!(suggestion.method, SuggestionMethod::Emergency);
    assert_ne!(suggestion.text, PASSIVE);
    assert_eq!(
        log.states_visited(),
        vec![
            ResolutionState::TryDeterministic,
            ResolutionState::TryKnowledgeModel,
            ResolutionState::TryModelOnly,
            ResolutionState::Emergency,
        ]
    );
}

#[tokio::test]
async fn test_emergency_annotates_unmatched_passive() {
    let orchestrator = Orchestrator::builder().build();
    let suggestion = orchestrator
        .resolve(&Issue::new("Avoid passive voice", "Mistakes were made."))
        .await;

    assert_eq!(suggestion.method, SuggestionMethod::Emergency);
    assert_eq!(suggestion.confidence, Confidence::Low);
    assert!(suggestion.text.starts_with("Mistakes were made."));
    assert!(suggestion.text.contains("[Consider:"));
}

#[tokio::test]
async fn test_empty_sentence_returns_guidance() {
    let backend = ScriptedBackend::new("local", vec![Step::Reply(ACTIVE)]);
    let orchestrator = Orchestrator::builder().backend(backend.clone()).build();

    let suggestion = orchestrator
        .resolve(&Issue::new("Avoid passive voice", "   "))
        .await;

    assert_eq!(suggestion.method, SuggestionMethod::GuidanceFallback);
    assert!(!suggestion.success);
    assert!(!suggestion.text.is_empty());
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_cancellation_jumps_to_emergency() {
    let backend = ScriptedBackend::new("local", vec![Step::Hang]);
    let (retriever, _) = retriever_with(vec![KnowledgeChunk::new("Prefer active voice.", 0.8)]);
    let tiers = TimeoutTiers::new(vec![TimeoutTier::new("long", 30_000)]).unwrap();
    let orchestrator = Orchestrator::builder()
        .backend(backend.clone())
        .retriever(retriever)
        .tiers(tiers)
        .build();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let (suggestion, log) = orchestrator
        .resolve_with_cancel(&passive_issue(), cancel)
        .await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(suggestion.method, SuggestionMethod::Emergency);
    assert!(log
        .attempts
        .iter()
        .any(|a| a.reason == Some(TransitionReason::Cancelled)));
    assert!(!log.states_visited().contains(&ResolutionState::TryModelOnly));
}

#[tokio::test]
async fn test_every_issue_type_gets_non_empty_text() {
    let backend = ScriptedBackend::new("local", vec![Step::Fail(transport_error())]);
    let orchestrator = Orchestrator::builder().backend(backend).build();
    let types = [
        IssueType::PassiveVoice,
        IssueType::LongSentence,
        IssueType::Wordiness,
        IssueType::Redundancy,
        IssueType::Contraction,
        IssueType::FirstPerson,
        IssueType::VagueLanguage,
        IssueType::WeakModifier,
        IssueType::Nominalization,
        IssueType::ModalVerb,
        IssueType::Capitalization,
        IssueType::Grammar,
        IssueType::Other,
    ];

    for issue_type in types {
        for sentence in ["", "x", "The report might possibly be somewhat late."] {
            let issue = Issue::new("style", sentence).with_issue_type(issue_type);
            let suggestion = orchestrator.resolve(&issue).await;
            assert!(
                !suggestion.text.trim().is_empty(),
                "{:?} produced empty text for {:?}",
                issue_type,
                sentence
            );
        }
    }
}
