//! Integration tests for the elapsed-time tracker against real stores.
//!
//! These tests verify persistence across tracker re-creation, completion
//! timing and accumulation bounds.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use lessongate_core::{ElapsedTracker, KeyValueStore, ManualClock, SqliteStore};
use proptest::prelude::*;

fn sqlite_tracker(
    store: &Arc<SqliteStore>,
    clock: &Arc<ManualClock>,
    item_id: &str,
    minutes: f64,
) -> ElapsedTracker {
    ElapsedTracker::builder(item_id, minutes)
        .store(store.clone())
        .clock(clock.clone())
        .build()
        .unwrap()
}

#[test]
fn test_persistence_roundtrip_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lessongate.db");
    let clock = Arc::new(ManualClock::new(0));

    {
        let store = Arc::new(SqliteStore::open_path(&path).unwrap());
        let mut tracker = sqlite_tracker(&store, &clock, "lesson-7", 5.0);
        tracker.start();
        for _ in 0..3 {
            clock.advance(Duration::from_secs(1));
            tracker.tick();
        }
        clock.advance(Duration::from_millis(1_200));
        tracker.pause();
        assert_eq!(tracker.elapsed_secs(), 4);
    }

    // Simulates a page reload: new process, new store handle.
    let store = Arc::new(SqliteStore::open_path(&path).unwrap());
    assert_eq!(store.get("time-tracking-lesson-7").unwrap().as_deref(), Some("4"));
    let mut tracker = sqlite_tracker(&store, &clock, "lesson-7", 5.0);
    assert_eq!(tracker.elapsed_secs(), 4);

    tracker.resume();
    clock.advance(Duration::from_secs(10));
    tracker.tick();
    assert_eq!(tracker.elapsed_secs(), 14);
}

#[test]
fn test_completion_by_six_seconds() {
    let store = Arc::new(SqliteStore::open_memory().unwrap());
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = fired.clone();
    let mut tracker = ElapsedTracker::builder("quiz-intro", 0.1)
        .store(store.clone())
        .clock(clock.clone())
        .on_time_complete(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap();

    tracker.start();
    for second in 1..=20u64 {
        clock.advance(Duration::from_secs(1));
        tracker.tick();
        if second >= 6 {
            assert!(tracker.is_complete(), "complete at t={second}s");
            assert!(fired.load(Ordering::SeqCst) >= 1);
        } else {
            assert!(!tracker.is_complete(), "not complete at t={second}s");
        }
    }
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert_eq!(tracker.progress_percent(), 100.0);
    assert_eq!(tracker.remaining_minutes(), 0);
}

#[test]
fn test_reset_clears_persisted_state() {
    let store = Arc::new(SqliteStore::open_memory().unwrap());
    let clock = Arc::new(ManualClock::new(0));
    let mut tracker = sqlite_tracker(&store, &clock, "lesson-1", 5.0);
    tracker.start();
    clock.advance(Duration::from_secs(90));
    tracker.tick();
    tracker.reset();
    drop(tracker);

    let tracker = sqlite_tracker(&store, &clock, "lesson-1", 5.0);
    assert_eq!(tracker.elapsed_secs(), 0);
    assert!(store.keys_with_prefix("time-tracking-").unwrap().is_empty());
}

#[test]
fn test_items_do_not_share_state() {
    let store = Arc::new(SqliteStore::open_memory().unwrap());
    let clock = Arc::new(ManualClock::new(0));
    let mut a = sqlite_tracker(&store, &clock, "a", 5.0);
    let mut b = sqlite_tracker(&store, &clock, "b", 5.0);
    a.start();
    clock.advance(Duration::from_secs(5));
    b.start();
    clock.advance(Duration::from_secs(5));
    a.tick();
    b.tick();
    b.reset();

    assert_eq!(store.get("time-tracking-a").unwrap().as_deref(), Some("10"));
    assert!(store.get("time-tracking-b").unwrap().is_none());
}

#[derive(Debug, Clone)]
enum Op {
    Start,
    Pause,
    Resume,
    Tick,
    Advance(u64),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Start),
        Just(Op::Pause),
        Just(Op::Resume),
        Just(Op::Tick),
        (0u64..5_000).prop_map(Op::Advance),
    ]
}

proptest! {
    #[test]
    fn prop_accumulation_is_monotonic_and_bounded(ops in proptest::collection::vec(op(), 1..60)) {
        let clock = Arc::new(ManualClock::new(0));
        let mut tracker = ElapsedTracker::builder("prop", 1_000.0)
            .clock(clock.clone())
            .build()
            .unwrap();

        let mut running = false;
        let mut active_ms = 0u64;
        let mut sessions = 0u64;
        let mut last = 0u64;

        for op in ops {
            match op {
                Op::Start => {
                    if !running {
                        sessions += 1;
                    }
                    running = true;
                    tracker.start();
                }
                Op::Pause => {
                    running = false;
                    tracker.pause();
                }
                Op::Resume => {
                    if !running {
                        sessions += 1;
                    }
                    running = true;
                    tracker.resume();
                }
                Op::Tick => {
                    tracker.tick();
                }
                Op::Advance(ms) => {
                    if running {
                        active_ms += ms;
                    }
                    clock.advance(Duration::from_millis(ms));
                }
            }
            prop_assert!(tracker.elapsed_secs() >= last);
            last = tracker.elapsed_secs();
        }

        tracker.pause();
        let elapsed = tracker.elapsed_secs();
        prop_assert!(elapsed >= last);
        prop_assert!(elapsed <= active_ms / 1000);
        prop_assert!(elapsed + sessions >= active_ms / 1000);
    }
}
