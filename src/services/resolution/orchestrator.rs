//! Resolution Orchestrator
//!
//! Drives one issue through the fallback states
//! `TryDeterministic → TryKnowledgeModel → TryModelOnly → Emergency`.
//! Every failure becomes a forward transition; callers always receive a
//! suggestion.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use prose_cascade_core::{Confidence, Issue, KnowledgeChunk, Suggestion, SuggestionMethod};
use prose_cascade_llm::{
    create_backend, BackendKind, GenerateRequest, LlmError, ModelBackend, QuotaState,
    QuotaTracker,
};
use prose_cascade_quality_gates::{QualityGate, ValidationOptions};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument};

use super::deterministic::DeterministicRewriter;
use super::emergency::{guidance_for, EmergencyGenerator};
use super::prompts::{clean_model_output, knowledge_prompt, model_only_prompt};
use super::state::{ResolutionLog, ResolutionState, TierAttempt, TransitionReason};
use super::tiers::{Complexity, TimeoutTiers};
use crate::models::{AppConfig, KnowledgeSettings};
use crate::services::knowledge::{
    HttpVectorStore, InMemoryVectorStore, KnowledgeRetriever, ResponseCache, VectorStore,
};
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::quota_state_path;

const DEFAULT_TOP_K: usize = 3;
const DEFAULT_STRONG_MATCH: f32 = 0.6;

/// Per-call bookkeeping.
struct ResolutionContext {
    log: ResolutionLog,
    /// Backends not to be tried again during this resolution
    excluded: HashSet<String>,
    cancel: CancellationToken,
}

/// Resolves writing issues into suggestions.
pub struct Orchestrator {
    backends: Vec<Arc<dyn ModelBackend>>,
    retriever: Arc<KnowledgeRetriever>,
    gate: QualityGate,
    tiers: TimeoutTiers,
    quota: Option<Arc<QuotaTracker>>,
    deterministic: DeterministicRewriter,
    emergency: EmergencyGenerator,
    top_k: usize,
    strong_match_similarity: f32,
}

impl Orchestrator {
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    /// Build from configuration, with quota state in the configured file
    /// (default `~/.prose-cascade/quota.json`).
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let path = match &config.quota.state_path {
            Some(path) => path.clone(),
            None => quota_state_path()?,
        };
        let quota = Arc::new(QuotaTracker::load_default(
            path,
            Some(config.quota.daily_limit),
        ));
        Self::from_config_with_quota(config, quota)
    }

    /// Build from configuration with an injected quota tracker.
    pub fn from_config_with_quota(
        config: &AppConfig,
        quota: Arc<QuotaTracker>,
    ) -> AppResult<Self> {
        config.validate().map_err(AppError::config)?;
        let tiers = config.timeout_tiers().map_err(AppError::config)?;

        let backends = config
            .backends
            .iter()
            .cloned()
            .map(|backend| create_backend(backend, quota.clone()))
            .collect::<Result<Vec<_>, LlmError>>()?;

        let cache = Arc::new(ResponseCache::new(
            config.cache.max_entries,
            Duration::from_secs(config.cache.ttl_secs),
        ));
        let retriever = build_retriever(&config.knowledge, cache);

        info!(
            backends = backends.len(),
            knowledge = retriever.is_enabled(),
            "Orchestrator configured"
        );

        Ok(Self::builder()
            .backends(backends)
            .retriever(Arc::new(retriever))
            .quality_gate(QualityGate::new(config.quality.clone()))
            .tiers(tiers)
            .quota(quota)
            .top_k(config.knowledge.top_k)
            .strong_match_similarity(config.knowledge.strong_match_similarity)
            .build())
    }

    /// Current quota usage, when a tracker is attached.
    pub fn quota_status(&self) -> Option<QuotaState> {
        self.quota.as_ref().map(|q| q.status())
    }

    /// Resolve free-form feedback on a sentence.
    pub async fn resolve_feedback(
        &self,
        feedback: &str,
        sentence: &str,
        document_type: Option<&str>,
        writing_goals: &[String],
    ) -> Suggestion {
        let mut issue = Issue::new(feedback, sentence).with_writing_goals(writing_goals.to_vec());
        if let Some(document_type) = document_type {
            issue = issue.with_document_type(document_type);
        }
        self.resolve(&issue).await
    }

    /// Resolve an issue. Never fails.
    pub async fn resolve(&self, issue: &Issue) -> Suggestion {
        self.run(issue, CancellationToken::new()).await.0
    }

    /// Resolve an issue and return the attempt log.
    pub async fn resolve_with_log(&self, issue: &Issue) -> (Suggestion, ResolutionLog) {
        self.run(issue, CancellationToken::new()).await
    }

    /// Resolve an issue; cancelling `cancel` abandons any in-flight call and
    /// falls through to the emergency generator.
    pub async fn resolve_with_cancel(
        &self,
        issue: &Issue,
        cancel: CancellationToken,
    ) -> (Suggestion, ResolutionLog) {
        self.run(issue, cancel).await
    }

    async fn run(&self, issue: &Issue, cancel: CancellationToken) -> (Suggestion, ResolutionLog) {
        let log = ResolutionLog::new();
        let span = tracing::info_span!(
            "resolve",
            resolution_id = %log.resolution_id,
            issue_type = %issue.issue_type
        );
        let mut ctx = ResolutionContext {
            log,
            excluded: HashSet::new(),
            cancel,
        };

        async move {
            let started = Instant::now();
            let (suggestion, state) = self.run_states(issue, &mut ctx).await;
            ctx.log.finish(state, suggestion.method, started.elapsed());
            info!(
                method = %suggestion.method,
                confidence = %suggestion.confidence,
                final_state = %state,
                attempts = ctx.log.attempts.len(),
                failed = ctx.log.failed_attempts_count(),
                duration_ms = ctx.log.total_duration_ms,
                "Resolution finished"
            );
            (suggestion, ctx.log)
        }
        .instrument(span)
        .await
    }

    async fn run_states(
        &self,
        issue: &Issue,
        ctx: &mut ResolutionContext,
    ) -> (Suggestion, ResolutionState) {
        if issue.sentence().is_empty() {
            let hint = guidance_for(issue.issue_type);
            debug!("Empty sentence context, returning guidance only");
            return (
                Suggestion::guidance_only(hint, "", SuggestionMethod::GuidanceFallback, hint),
                ResolutionState::Emergency,
            );
        }

        let mut state = ResolutionState::TryDeterministic;
        loop {
            if ctx.cancel.is_cancelled() && !state.is_terminal() {
                let already_logged = ctx
                    .log
                    .attempts
                    .last()
                    .is_some_and(|a| a.reason == Some(TransitionReason::Cancelled));
                if !already_logged {
                    ctx.log.add_attempt(TierAttempt::failure(
                        state,
                        None,
                        None,
                        TransitionReason::Cancelled,
                        "resolution cancelled",
                        Duration::ZERO,
                    ));
                }
                info!(from = %state, "Resolution cancelled, jumping to emergency");
                state = ResolutionState::Emergency;
            }

            let outcome = match state {
                ResolutionState::TryDeterministic => self.try_deterministic(issue, ctx),
                ResolutionState::TryKnowledgeModel => self.try_knowledge_model(issue, ctx).await,
                ResolutionState::TryModelOnly => self.try_model_only(issue, ctx).await,
                ResolutionState::Emergency => {
                    let started = Instant::now();
                    let suggestion = self.emergency.generate_for(issue);
                    ctx.log.add_attempt(TierAttempt::success(
                        state,
                        None,
                        None,
                        started.elapsed(),
                    ));
                    return (suggestion, state);
                }
            };

            match outcome {
                Some(suggestion) => return (suggestion, state),
                None => {
                    let next = state.next().unwrap_or(ResolutionState::Emergency);
                    debug!(from = %state, to = %next, "State transition");
                    state = next;
                }
            }
        }
    }

    fn try_deterministic(&self, issue: &Issue, ctx: &mut ResolutionContext) -> Option<Suggestion> {
        let state = ResolutionState::TryDeterministic;
        let started = Instant::now();

        let candidate = if self.deterministic.handles(issue.issue_type) {
            self.deterministic.rewrite(issue).ok_or("no rule matched")
        } else {
            Err("no rules for this issue type")
        };
        let candidate = match candidate {
            Ok(candidate) => candidate,
            Err(detail) => {
                ctx.log.add_attempt(TierAttempt::failure(
                    state,
                    None,
                    None,
                    TransitionReason::NoMatch,
                    detail,
                    started.elapsed(),
                ));
                return None;
            }
        };

        let verdict =
            self.gate
                .validate_with(issue.sentence(), &candidate, ValidationOptions::relaxed());
        if !verdict.is_accepted() {
            debug!("Rule rewrite rejected: {}", verdict.summary());
            ctx.log.add_attempt(TierAttempt::failure(
                state,
                None,
                None,
                TransitionReason::QualityRejected,
                verdict.summary(),
                started.elapsed(),
            ));
            return None;
        }

        ctx.log
            .add_attempt(TierAttempt::success(state, None, None, started.elapsed()));
        Some(
            Suggestion::rewrite(
                verdict.candidate,
                issue.sentence(),
                SuggestionMethod::Deterministic,
                Confidence::High,
            )
            .with_guidance(guidance_for(issue.issue_type)),
        )
    }

    async fn try_knowledge_model(
        &self,
        issue: &Issue,
        ctx: &mut ResolutionContext,
    ) -> Option<Suggestion> {
        let state = ResolutionState::TryKnowledgeModel;
        if !self.has_available_backend(ctx) {
            self.log_no_backend(state, ctx);
            return None;
        }

        let started = Instant::now();
        let query = format!("{} {}", issue.issue_type.label(), issue.issue_text.trim());
        let chunks = self
            .retriever
            .retrieve_with_cancel(&query, self.top_k, &ctx.cancel)
            .await;
        if chunks.is_empty() {
            let reason = if ctx.cancel.is_cancelled() {
                TransitionReason::Cancelled
            } else {
                TransitionReason::NoMatch
            };
            ctx.log.add_attempt(TierAttempt::failure(
                state,
                None,
                None,
                reason,
                "no relevant guidance retrieved",
                started.elapsed(),
            ));
            return None;
        }
        debug!(chunks = chunks.len(), "Retrieved guidance");

        let request = knowledge_prompt(issue, &chunks);
        let text = self.try_backends(state, issue, &request, ctx).await?;

        let best = chunks
            .iter()
            .map(|c| c.similarity)
            .fold(0.0_f32, f32::max);
        let confidence = if best >= self.strong_match_similarity {
            Confidence::High
        } else {
            Confidence::Medium
        };
        Some(
            Suggestion::rewrite(text, issue.sentence(), SuggestionMethod::KnowledgeLlm, confidence)
                .with_sources(chunks.iter().map(KnowledgeChunk::source_ref).collect()),
        )
    }

    async fn try_model_only(
        &self,
        issue: &Issue,
        ctx: &mut ResolutionContext,
    ) -> Option<Suggestion> {
        let state = ResolutionState::TryModelOnly;
        if !self.has_available_backend(ctx) {
            self.log_no_backend(state, ctx);
            return None;
        }

        let request = model_only_prompt(issue);
        let text = self.try_backends(state, issue, &request, ctx).await?;
        Some(Suggestion::rewrite(
            text,
            issue.sentence(),
            SuggestionMethod::LlmOnly,
            Confidence::Medium,
        ))
    }

    fn has_available_backend(&self, ctx: &ResolutionContext) -> bool {
        self.backends
            .iter()
            .any(|b| !ctx.excluded.contains(b.name()))
    }

    fn log_no_backend(&self, state: ResolutionState, ctx: &mut ResolutionContext) {
        ctx.log.add_attempt(TierAttempt::failure(
            state,
            None,
            None,
            TransitionReason::NoMatch,
            "no backend available",
            Duration::ZERO,
        ));
    }

    /// Try each available backend in order, escalating through timeout tiers
    /// on timeouts. Returns the first gate-accepted rewrite.
    async fn try_backends(
        &self,
        state: ResolutionState,
        issue: &Issue,
        request: &GenerateRequest,
        ctx: &mut ResolutionContext,
    ) -> Option<String> {
        let start_tier = self.tiers.start_for(Complexity::classify(issue));

        for backend in &self.backends {
            let name = backend.name();
            if ctx.excluded.contains(name) {
                continue;
            }

            if backend.kind() == BackendKind::Metered
                && self.quota.as_ref().is_some_and(|q| !q.can_proceed())
            {
                info!(backend = name, "Daily quota exhausted, skipping backend");
                ctx.log.add_attempt(TierAttempt::failure(
                    state,
                    Some(name),
                    None,
                    TransitionReason::QuotaExceeded,
                    "daily quota exhausted",
                    Duration::ZERO,
                ));
                ctx.excluded.insert(name.to_string());
                continue;
            }

            let mut tier_index = start_tier;
            while let Some(tier) = self.tiers.get(tier_index) {
                let timeout = tier.timeout();
                let started = Instant::now();
                debug!(backend = name, tier = %tier.name, timeout_ms = tier.timeout_ms, "Calling backend");

                let call = tokio::time::timeout(timeout, backend.generate(request, timeout));
                let result = tokio::select! {
                    biased;
                    _ = ctx.cancel.cancelled() => None,
                    result = call => Some(result.unwrap_or(Err(LlmError::Timeout {
                        timeout_ms: tier.timeout_ms,
                    }))),
                };
                let elapsed = started.elapsed();

                let Some(result) = result else {
                    ctx.log.add_attempt(TierAttempt::failure(
                        state,
                        Some(name),
                        Some(tier.name.as_str()),
                        TransitionReason::Cancelled,
                        "backend call cancelled",
                        elapsed,
                    ));
                    return None;
                };

                match result {
                    Ok(raw) => {
                        let candidate = clean_model_output(&raw);
                        let verdict = self.gate.validate(issue.sentence(), &candidate);
                        if verdict.is_accepted() {
                            ctx.log.add_attempt(TierAttempt::success(
                                state,
                                Some(name),
                                Some(tier.name.as_str()),
                                elapsed,
                            ));
                            return Some(verdict.candidate);
                        }
                        info!(backend = name, "Backend output rejected: {}", verdict.summary());
                        ctx.log.add_attempt(TierAttempt::failure(
                            state,
                            Some(name),
                            Some(tier.name.as_str()),
                            TransitionReason::QualityRejected,
                            verdict.summary(),
                            elapsed,
                        ));
                        break;
                    }
                    Err(err) => {
                        let reason = TransitionReason::from(&err);
                        warn!(backend = name, tier = %tier.name, reason = %reason, "Backend call failed: {}", err);
                        ctx.log.add_attempt(TierAttempt::failure(
                            state,
                            Some(name),
                            Some(tier.name.as_str()),
                            reason,
                            err.to_string(),
                            elapsed,
                        ));

                        if reason == TransitionReason::Timeout {
                            if let Some(next) = self.tiers.next(tier_index) {
                                tier_index = next;
                                continue;
                            }
                            ctx.excluded.insert(name.to_string());
                        } else if reason.excludes_backend() {
                            ctx.excluded.insert(name.to_string());
                        }
                        break;
                    }
                }
            }
        }
        None
    }
}

fn build_retriever(settings: &KnowledgeSettings, cache: Arc<ResponseCache>) -> KnowledgeRetriever {
    if !settings.enabled {
        return KnowledgeRetriever::disabled();
    }

    let store: Option<Arc<dyn VectorStore>> = if let Some(base_url) = &settings.base_url {
        match HttpVectorStore::new(base_url, settings.collection.clone()) {
            Ok(store) => Some(Arc::new(store)),
            Err(e) => {
                warn!("Knowledge store unavailable, retrieval disabled: {}", e);
                None
            }
        }
    } else if let Some(path) = &settings.corpus_path {
        match InMemoryVectorStore::from_json_file(path) {
            Ok(store) => Some(Arc::new(store)),
            Err(e) => {
                warn!(
                    "Failed to load knowledge corpus {}, retrieval disabled: {}",
                    path.display(),
                    e
                );
                None
            }
        }
    } else {
        None
    };

    match store {
        Some(store) => KnowledgeRetriever::new(
            store,
            cache,
            settings.min_similarity,
            Duration::from_millis(settings.timeout_ms),
        ),
        None => KnowledgeRetriever::disabled(),
    }
}

/// Builder for [`Orchestrator`].
pub struct OrchestratorBuilder {
    backends: Vec<Arc<dyn ModelBackend>>,
    retriever: Option<Arc<KnowledgeRetriever>>,
    gate: Option<QualityGate>,
    tiers: Option<TimeoutTiers>,
    quota: Option<Arc<QuotaTracker>>,
    top_k: usize,
    strong_match_similarity: f32,
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            backends: Vec::new(),
            retriever: None,
            gate: None,
            tiers: None,
            quota: None,
            top_k: DEFAULT_TOP_K,
            strong_match_similarity: DEFAULT_STRONG_MATCH,
        }
    }

    /// Append a backend; backends are tried in insertion order.
    pub fn backend(mut self, backend: Arc<dyn ModelBackend>) -> Self {
        self.backends.push(backend);
        self
    }

    pub fn backends(mut self, backends: Vec<Arc<dyn ModelBackend>>) -> Self {
        self.backends.extend(backends);
        self
    }

    pub fn retriever(mut self, retriever: Arc<KnowledgeRetriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    pub fn quality_gate(mut self, gate: QualityGate) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn tiers(mut self, tiers: TimeoutTiers) -> Self {
        self.tiers = Some(tiers);
        self
    }

    /// Quota tracker consulted before calling metered backends.
    pub fn quota(mut self, quota: Arc<QuotaTracker>) -> Self {
        self.quota = Some(quota);
        self
    }

    pub fn top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn strong_match_similarity(mut self, similarity: f32) -> Self {
        self.strong_match_similarity = similarity;
        self
    }

    pub fn build(self) -> Orchestrator {
        Orchestrator {
            backends: self.backends,
            retriever: self
                .retriever
                .unwrap_or_else(|| Arc::new(KnowledgeRetriever::disabled())),
            gate: self.gate.unwrap_or_default(),
            tiers: self.tiers.unwrap_or_default(),
            quota: self.quota,
            deterministic: DeterministicRewriter::new(),
            emergency: EmergencyGenerator::new(),
            top_k: self.top_k,
            strong_match_similarity: self.strong_match_similarity,
        }
    }
}
