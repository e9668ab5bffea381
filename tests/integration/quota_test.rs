//! Quota Integration Tests
//!
//! Persisted daily budget: resets, concurrency and corrupt state files.

use std::fs;
use std::sync::Arc;
use std::thread;

use chrono::{Duration, TimeZone, Utc};
use prose_cascade_core::FixedClock;
use prose_cascade_llm::{QuotaState, QuotaTracker};
use tempfile::TempDir;

// ============================================================================
// Helper Functions
// ============================================================================

fn write_state(temp: &TempDir, state: &QuotaState) -> std::path::PathBuf {
    let path = temp.path().join("quota.json");
    fs::write(&path, serde_json::to_string(state).unwrap()).unwrap();
    path
}

fn read_state(path: &std::path::Path) -> QuotaState {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn test_next_day_resets_usage() {
    let temp = TempDir::new().unwrap();
    let day1 = Utc.with_ymd_and_hms(2026, 5, 4, 18, 30, 0).unwrap();
    let path = write_state(
        &temp,
        &QuotaState {
            usage_count: 37,
            limit: 50,
            last_reset: day1,
        },
    );

    let clock = Arc::new(FixedClock::new(day1));
    let tracker = QuotaTracker::load(&path, None, clock.clone());
    assert_eq!(tracker.status().usage_count, 37);

    clock.advance(Duration::hours(8));
    assert!(tracker.can_proceed());
    assert_eq!(tracker.status().usage_count, 0);

    tracker.record_use();
    assert_eq!(tracker.status().usage_count, 1);
    assert_eq!(read_state(&path).usage_count, 1);
}

#[test]
fn test_same_day_keeps_usage() {
    let temp = TempDir::new().unwrap();
    let morning = Utc.with_ymd_and_hms(2026, 5, 4, 0, 5, 0).unwrap();
    let path = write_state(
        &temp,
        &QuotaState {
            usage_count: 10,
            limit: 50,
            last_reset: morning,
        },
    );

    let clock = Arc::new(FixedClock::new(morning));
    let tracker = QuotaTracker::load(&path, None, clock.clone());
    clock.advance(Duration::hours(23));
    tracker.record_use();
    assert_eq!(tracker.status().usage_count, 11);
}

#[test]
fn test_usage_persists_across_reloads() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("quota.json");
    let now = Utc.with_ymd_and_hms(2026, 5, 4, 9, 0, 0).unwrap();
    let clock = Arc::new(FixedClock::new(now));

    {
        let tracker = QuotaTracker::load(&path, Some(5), clock.clone());
        assert!(tracker.try_acquire());
        assert!(tracker.try_acquire());
    }

    let reloaded = QuotaTracker::load(&path, Some(5), clock);
    assert_eq!(reloaded.status().usage_count, 2);
    assert_eq!(reloaded.status().remaining(), 3);
}

#[test]
fn test_concurrent_acquire_never_exceeds_limit() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("quota.json");
    let clock = Arc::new(FixedClock::new(Utc::now()));
    let tracker = Arc::new(QuotaTracker::load(&path, Some(50), clock));

    let handles: Vec<_> = (0..100)
        .map(|_| {
            let tracker = tracker.clone();
            thread::spawn(move || tracker.try_acquire())
        })
        .collect();
    let granted = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();

    assert_eq!(granted, 50);
    assert_eq!(tracker.status().usage_count, 50);
    assert_eq!(read_state(&path).usage_count, 50);
}

#[test]
fn test_mark_exhausted_blocks_until_next_day() {
    let now = Utc.with_ymd_and_hms(2026, 5, 4, 12, 0, 0).unwrap();
    let clock = Arc::new(FixedClock::new(now));
    let tracker = QuotaTracker::in_memory(50, clock.clone());
    tracker.record_use();

    tracker.mark_exhausted();
    assert!(!tracker.can_proceed());
    assert!(!tracker.try_acquire());
    assert_eq!(tracker.status().usage_count, 50);

    tracker.record_use();
    assert_eq!(tracker.status().usage_count, 50);

    clock.advance(Duration::days(1));
    assert!(tracker.try_acquire());
}

#[test]
fn test_corrupt_file_starts_fresh() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("quota.json");
    fs::write(&path, "{ not json").unwrap();

    let clock = Arc::new(FixedClock::new(Utc::now()));
    let tracker = QuotaTracker::load(&path, Some(20), clock);

    let status = tracker.status();
    assert_eq!(status.usage_count, 0);
    assert_eq!(status.limit, 20);
    // The corrupt file was replaced with valid state
    assert_eq!(read_state(&path).limit, 20);
}

#[test]
fn test_missing_file_starts_fresh() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join("quota.json");

    let clock = Arc::new(FixedClock::new(Utc::now()));
    let tracker = QuotaTracker::load(&path, None, clock);

    assert_eq!(tracker.status().usage_count, 0);
    assert!(tracker.can_proceed());
}
