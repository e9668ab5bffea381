//! Daily Quota Tracker
//!
//! Persists and enforces a daily call budget for metered backends. State is
//! a flat JSON document rewritten after every mutation and reset when the
//! UTC calendar date moves past the last reset.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use prose_cascade_core::{Clock, CoreError, CoreResult, SystemClock};

/// Default daily call budget.
pub const DEFAULT_DAILY_LIMIT: u32 = 50;

/// Persisted quota state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaState {
    /// Metered calls spent since `last_reset`
    pub usage_count: u32,
    /// Daily budget
    pub limit: u32,
    /// Instant of the last reset
    pub last_reset: DateTime<Utc>,
}

impl QuotaState {
    fn fresh(limit: u32, now: DateTime<Utc>) -> Self {
        Self {
            usage_count: 0,
            limit,
            last_reset: now,
        }
    }

    /// Calls left today.
    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.usage_count)
    }
}

/// Thread-safe quota tracker shared by all metered backends.
pub struct QuotaTracker {
    path: Option<PathBuf>,
    clock: Arc<dyn Clock>,
    state: Mutex<QuotaState>,
}

impl std::fmt::Debug for QuotaTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuotaTracker")
            .field("path", &self.path)
            .field("state", &*self.lock())
            .finish()
    }
}

impl QuotaTracker {
    /// Load the tracker from `path`, starting fresh when the file is missing
    /// or unreadable. A configured `limit` overrides the persisted one.
    pub fn load(path: impl Into<PathBuf>, limit: Option<u32>, clock: Arc<dyn Clock>) -> Self {
        let path = path.into();
        let now = clock.now();
        let mut state = match read_state(&path) {
            Ok(Some(state)) => state,
            Ok(None) => QuotaState::fresh(DEFAULT_DAILY_LIMIT, now),
            Err(e) => {
                tracing::warn!(
                    "Quota state at {} unreadable, starting fresh: {}",
                    path.display(),
                    e
                );
                QuotaState::fresh(DEFAULT_DAILY_LIMIT, now)
            }
        };
        if let Some(limit) = limit {
            state.limit = limit;
        }

        let tracker = Self {
            path: Some(path),
            clock,
            state: Mutex::new(state),
        };
        let guard = tracker.lock();
        tracker.persist(&guard);
        drop(guard);
        tracker
    }

    /// Load with the system clock.
    pub fn load_default(path: impl Into<PathBuf>, limit: Option<u32>) -> Self {
        Self::load(path, limit, Arc::new(SystemClock))
    }

    /// Tracker that never touches the filesystem.
    pub fn in_memory(limit: u32, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        Self {
            path: None,
            clock,
            state: Mutex::new(QuotaState::fresh(limit, now)),
        }
    }

    /// Whether a metered call may proceed right now.
    pub fn can_proceed(&self) -> bool {
        let mut state = self.lock();
        self.roll_over(&mut state);
        state.usage_count < state.limit
    }

    /// Count one metered call. Saturates at the limit.
    pub fn record_use(&self) {
        let mut state = self.lock();
        self.roll_over(&mut state);
        if state.usage_count < state.limit {
            state.usage_count += 1;
        }
        self.persist(&state);
    }

    /// Check and count in one step. Returns `false` when the budget is spent.
    pub fn try_acquire(&self) -> bool {
        let mut state = self.lock();
        self.roll_over(&mut state);
        if state.usage_count >= state.limit {
            tracing::debug!(
                "Quota exhausted: {}/{}",
                state.usage_count,
                state.limit
            );
            return false;
        }
        state.usage_count += 1;
        self.persist(&state);
        true
    }

    /// Force the budget to exhausted after a backend quota signal.
    pub fn mark_exhausted(&self) {
        let mut state = self.lock();
        self.roll_over(&mut state);
        state.usage_count = state.usage_count.max(state.limit);
        tracing::warn!("Metered quota marked exhausted for today");
        self.persist(&state);
    }

    /// Snapshot of the current state (after any pending daily reset).
    pub fn status(&self) -> QuotaState {
        let mut state = self.lock();
        self.roll_over(&mut state);
        state.clone()
    }

    fn lock(&self) -> MutexGuard<'_, QuotaState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn roll_over(&self, state: &mut QuotaState) {
        let now = self.clock.now();
        if now.date_naive() > state.last_reset.date_naive() {
            tracing::info!(
                "Daily quota reset (was {}/{})",
                state.usage_count,
                state.limit
            );
            state.usage_count = 0;
            state.last_reset = now;
            self.persist(state);
        }
    }

    fn persist(&self, state: &QuotaState) {
        let Some(path) = &self.path else {
            return;
        };
        if let Err(e) = write_state(path, state) {
            tracing::warn!("Failed to persist quota state to {}: {}", path.display(), e);
        }
    }
}

fn read_state(path: &Path) -> CoreResult<Option<QuotaState>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let state = serde_json::from_str(&content)?;
    Ok(Some(state))
}

fn write_state(path: &Path, state: &QuotaState) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let content = serde_json::to_string_pretty(state)?;

    let file_name = path
        .file_name()
        .ok_or_else(|| CoreError::persistence("quota path has no file name"))?;
    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let mut file = fs::File::create(&tmp_path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}
