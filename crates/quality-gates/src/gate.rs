//! Quality Gate
//!
//! Accepts or rejects a candidate rewrite. All checks run independently and
//! every outcome is recorded; a single failure rejects the candidate.

use std::sync::Arc;

use crate::artifacts::find_meta_commentary;
use crate::grammar::{GrammarChecker, HeuristicGrammarChecker};
use crate::models::{
    CheckKind, CheckResult, GateVerdict, QualityConfig, RejectionReason, ValidationOptions,
};
use crate::similarity::{surface_similarity, token_similarity};

/// Validates model and rule output before it is shown to the user.
#[derive(Clone)]
pub struct QualityGate {
    config: QualityConfig,
    grammar: Option<Arc<dyn GrammarChecker>>,
}

impl std::fmt::Debug for QualityGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QualityGate")
            .field("config", &self.config)
            .field("grammar", &self.grammar.is_some())
            .finish()
    }
}

impl Default for QualityGate {
    fn default() -> Self {
        Self::new(QualityConfig::default())
    }
}

impl QualityGate {
    /// Gate with the heuristic grammar checker.
    pub fn new(config: QualityConfig) -> Self {
        Self {
            config,
            grammar: Some(Arc::new(HeuristicGrammarChecker)),
        }
    }

    /// Replace the grammar checker.
    pub fn with_grammar_checker(mut self, checker: Arc<dyn GrammarChecker>) -> Self {
        self.grammar = Some(checker);
        self
    }

    /// Disable grammar checking; the check is reported as skipped.
    pub fn without_grammar_checker(mut self) -> Self {
        self.grammar = None;
        self
    }

    /// Gate configuration.
    pub fn config(&self) -> &QualityConfig {
        &self.config
    }

    /// Validate with default options.
    pub fn validate(&self, original: &str, candidate: &str) -> GateVerdict {
        self.validate_with(original, candidate, ValidationOptions::default())
    }

    /// Validate with per-call options.
    pub fn validate_with(
        &self,
        original: &str,
        candidate: &str,
        options: ValidationOptions,
    ) -> GateVerdict {
        let candidate = candidate.trim();
        let mut checks = Vec::with_capacity(4);

        if candidate.is_empty() {
            checks.push(CheckResult::failed(CheckKind::NonEmpty, RejectionReason::Empty));
            let verdict = GateVerdict {
                candidate: String::new(),
                similarity: None,
                checks,
            };
            tracing::debug!("Quality gate: {}", verdict.summary());
            return verdict;
        }
        checks.push(CheckResult::passed(CheckKind::NonEmpty));

        let similarity = token_similarity(original, candidate);
        let surface = surface_similarity(original, candidate);
        checks.push(self.check_similarity(similarity, surface, options));
        checks.push(self.check_grammar(original, candidate));
        checks.push(self.check_meta_commentary(candidate));

        let verdict = GateVerdict {
            candidate: candidate.to_string(),
            similarity: Some(similarity),
            checks,
        };
        tracing::debug!(
            similarity,
            "Quality gate: {}",
            verdict.summary()
        );
        verdict
    }

    /// The ceiling is checked on surface tokens so that case and punctuation
    /// fixes count as edits; the floor is checked on normalized tokens.
    fn check_similarity(
        &self,
        similarity: f64,
        surface: f64,
        options: ValidationOptions,
    ) -> CheckResult {
        let max = options.max_similarity.unwrap_or(self.config.max_similarity);
        if surface >= max {
            CheckResult::failed(
                CheckKind::Similarity,
                RejectionReason::TooSimilar {
                    similarity: surface,
                },
            )
        } else if similarity < self.config.min_similarity {
            CheckResult::failed(
                CheckKind::Similarity,
                RejectionReason::TooDifferent { similarity },
            )
        } else {
            CheckResult::passed(CheckKind::Similarity)
        }
    }

    /// Rejects a candidate that adds grammar issues, or that leaves an
    /// original's existing issues unreduced.
    fn check_grammar(&self, original: &str, candidate: &str) -> CheckResult {
        let Some(checker) = &self.grammar else {
            return CheckResult::skipped(CheckKind::Grammar);
        };
        let (Some(before), Some(after)) =
            (checker.count_issues(original), checker.count_issues(candidate))
        else {
            return CheckResult::skipped(CheckKind::Grammar);
        };

        if after > before {
            CheckResult::failed(
                CheckKind::Grammar,
                RejectionReason::GrammarRegression {
                    original: before,
                    candidate: after,
                },
            )
        } else if before > 0 && after >= before {
            CheckResult::failed(
                CheckKind::Grammar,
                RejectionReason::NoGrammarImprovement {
                    original: before,
                    candidate: after,
                },
            )
        } else {
            CheckResult::passed(CheckKind::Grammar)
        }
    }

    fn check_meta_commentary(&self, candidate: &str) -> CheckResult {
        if !self.config.reject_meta_commentary {
            return CheckResult::skipped(CheckKind::MetaCommentary);
        }
        match find_meta_commentary(candidate) {
            Some(fragment) => CheckResult::failed(
                CheckKind::MetaCommentary,
                RejectionReason::MetaCommentary { fragment },
            ),
            None => CheckResult::passed(CheckKind::MetaCommentary),
        }
    }
}
