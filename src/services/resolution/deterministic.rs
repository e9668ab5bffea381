//! Rule-Based Rewriter
//!
//! Fixes mechanical issues without calling a model. The orchestrator still
//! passes the output through the quality gate.

use std::sync::LazyLock;

use prose_cascade_core::{Issue, IssueType};
use regex::Regex;

use super::patterns::{capitalize, table_for, tidy};

static LOWERCASE_I: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bi\b(['\u{2019}](m|ve|ll|d))?").unwrap());

/// Deterministic rewrites for mechanical issue types.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeterministicRewriter;

impl DeterministicRewriter {
    pub fn new() -> Self {
        Self
    }

    /// Whether a rule set exists for this issue type.
    pub fn handles(&self, issue_type: IssueType) -> bool {
        issue_type == IssueType::Capitalization || table_for(issue_type).is_some()
    }

    /// Rewrite the issue's sentence, or `None` when no rule matched or the
    /// result equals the input.
    pub fn rewrite(&self, issue: &Issue) -> Option<String> {
        let sentence = issue.sentence();
        if sentence.is_empty() {
            return None;
        }

        let rewritten = match issue.issue_type {
            IssueType::Capitalization => fix_capitalization(sentence),
            other => table_for(other)?.apply(sentence)?,
        };

        if rewritten.is_empty() || rewritten == sentence {
            return None;
        }
        Some(rewritten)
    }
}

fn fix_capitalization(sentence: &str) -> String {
    let fixed =
        LOWERCASE_I.replace_all(sentence, |caps: &regex::Captures| capitalize(&caps[0]));
    tidy(&capitalize(&fixed))
}
