//! Timeout Tiers
//!
//! Ordered table of per-call deadlines. Simple issues start at the shortest
//! tier; a timeout escalates to the next longer tier on the same backend.
//! No issue starts at the longest tier, so a first timeout always has
//! somewhere to escalate to when the table has more than one tier.

use std::time::Duration;

use prose_cascade_core::Issue;
use serde::{Deserialize, Serialize};

/// Word count at or below which a mechanical issue is considered simple.
const SIMPLE_MAX_WORDS: usize = 15;
/// Word count above which any issue is considered complex.
const COMPLEX_MIN_WORDS: usize = 30;

/// One named deadline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutTier {
    /// Tier name used in logs ("quick", "standard", ...)
    pub name: String,
    /// Deadline in milliseconds
    pub timeout_ms: u64,
}

impl TimeoutTier {
    pub fn new(name: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            name: name.into(),
            timeout_ms,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Default tier table: quick 5s, standard 12s, extended 20s.
pub fn default_tiers() -> Vec<TimeoutTier> {
    vec![
        TimeoutTier::new("quick", 5_000),
        TimeoutTier::new("standard", 12_000),
        TimeoutTier::new("extended", 20_000),
    ]
}

/// How much work a rewrite is expected to take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Simple,
    Moderate,
    Complex,
}

impl Complexity {
    /// Classify from sentence length and issue type.
    pub fn classify(issue: &Issue) -> Self {
        let words = issue.word_count();
        if words > COMPLEX_MIN_WORDS || issue.issue_type.is_structural() {
            Complexity::Complex
        } else if words <= SIMPLE_MAX_WORDS && issue.issue_type.is_mechanical() {
            Complexity::Simple
        } else {
            Complexity::Moderate
        }
    }
}

/// Validated, strictly ascending tier table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutTiers {
    tiers: Vec<TimeoutTier>,
}

impl Default for TimeoutTiers {
    fn default() -> Self {
        Self {
            tiers: default_tiers(),
        }
    }
}

impl TimeoutTiers {
    /// Build a table, rejecting empty or non-ascending input.
    pub fn new(tiers: Vec<TimeoutTier>) -> Result<Self, String> {
        if tiers.is_empty() {
            return Err("at least one timeout tier is required".to_string());
        }
        if tiers.iter().any(|t| t.timeout_ms == 0) {
            return Err("timeout tiers must be longer than 0ms".to_string());
        }
        if tiers.windows(2).any(|w| w[1].timeout_ms <= w[0].timeout_ms) {
            return Err("timeout tiers must be strictly ascending".to_string());
        }
        Ok(Self { tiers })
    }

    pub fn get(&self, index: usize) -> Option<&TimeoutTier> {
        self.tiers.get(index)
    }

    /// Index of the longest tier.
    pub fn top(&self) -> usize {
        self.tiers.len().saturating_sub(1)
    }

    /// Next longer tier after `index`, if any.
    pub fn next(&self, index: usize) -> Option<usize> {
        (index + 1 < self.tiers.len()).then_some(index + 1)
    }

    /// Starting tier for a complexity class, at most one below the top.
    pub fn start_for(&self, complexity: Complexity) -> usize {
        let wanted = match complexity {
            Complexity::Simple => 0,
            Complexity::Moderate | Complexity::Complex => 1,
        };
        wanted.min(self.top().saturating_sub(1))
    }
}
