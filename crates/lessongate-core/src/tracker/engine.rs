//! Elapsed-time tracker.
//!
//! A per-item stopwatch that accumulates active viewing time, persists it
//! under `"time-tracking-" + item_id`, and signals completion once the
//! required duration is reached. Like a wall-clock timer it has no internal
//! thread: the caller invokes `tick()` periodically (see `driver` for a
//! tokio task that does so).
//!
//! ## State Transitions
//!
//! ```text
//! Idle --start/resume--> Running --pause--> Idle
//! any  --reset--> Idle (accumulator = 0)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut tracker = ElapsedTracker::builder("lesson-42", 5.0)
//!     .store(store)
//!     .on_time_complete(|event| mark_lesson_complete(event.item_id()))
//!     .build()?;
//! tracker.start();
//! // Once per second:
//! tracker.tick(); // Some(Event::TimeCompleted) on the first tick past the threshold
//! ```

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};
use crate::error::TrackerError;
use crate::events::Event;
use crate::format;
use crate::storage::{KeyValueStore, MemoryStore};

pub const STORAGE_KEY_PREFIX: &str = "time-tracking-";

/// Persistence key for an item. `None` for an empty id (in-memory mode).
pub fn storage_key(item_id: &str) -> Option<String> {
    if item_id.is_empty() {
        None
    } else {
        Some(format!("{STORAGE_KEY_PREFIX}{item_id}"))
    }
}

/// Accepts only non-negative integers; anything else counts as absent.
pub fn parse_persisted(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackerState {
    Idle,
    Running,
}

/// Invoked with the `TimeCompleted` event.
pub type CompletionCallback = Box<dyn FnMut(&Event) + Send>;

pub struct TrackerBuilder {
    item_id: String,
    required_minutes: f64,
    store: Option<Arc<dyn KeyValueStore>>,
    clock: Option<Arc<dyn Clock>>,
    on_time_complete: Option<CompletionCallback>,
}

impl TrackerBuilder {
    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn on_time_complete<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&Event) + Send + 'static,
    {
        self.on_time_complete = Some(Box::new(callback));
        self
    }

    /// Validate the threshold, load persisted state and signal completion if
    /// the loaded value already satisfies it.
    ///
    /// # Errors
    /// Returns `InvalidRequiredMinutes` for zero, negative or non-finite minutes.
    pub fn build(self) -> Result<ElapsedTracker, TrackerError> {
        if !self.required_minutes.is_finite() || self.required_minutes <= 0.0 {
            return Err(TrackerError::InvalidRequiredMinutes(self.required_minutes));
        }

        let mut tracker = ElapsedTracker {
            key: storage_key(&self.item_id),
            item_id: self.item_id,
            required_secs: format::required_seconds(self.required_minutes),
            store: self
                .store
                .unwrap_or_else(|| Arc::new(MemoryStore::new())),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            on_time_complete: self.on_time_complete,
            state: TrackerState::Idle,
            elapsed_secs: 0,
            paused_secs: 0,
            session_start_ms: None,
            completion_signaled: false,
            pending_completion: None,
            persistence_degraded: false,
        };

        let loaded = tracker.load();
        tracker.elapsed_secs = loaded;
        tracker.paused_secs = loaded;
        tracker.pending_completion = tracker.check_completion();
        Ok(tracker)
    }
}

/// What a disposed tracker leaves behind.
#[derive(Debug, Clone, PartialEq)]
pub struct Disposal {
    /// Final state, taken after the closing pause.
    pub snapshot: Event,
    /// Completion reached by the closing pause (or never handed out).
    pub completion: Option<Event>,
}

/// Stopwatch for one tracked item.
///
/// Exclusively owns the item's state; the store copy is read once at build
/// time and overwritten on every change.
pub struct ElapsedTracker {
    item_id: String,
    key: Option<String>,
    required_secs: f64,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    on_time_complete: Option<CompletionCallback>,
    state: TrackerState,
    /// Displayed elapsed seconds.
    elapsed_secs: u64,
    /// Seconds accumulated by finished sessions.
    paused_secs: u64,
    /// Reference point of the current session (clock ms), set while Running.
    session_start_ms: Option<u64>,
    completion_signaled: bool,
    /// Completion discovered outside `tick()` (load, pause), not yet handed out.
    pending_completion: Option<Event>,
    persistence_degraded: bool,
}

impl std::fmt::Debug for ElapsedTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElapsedTracker")
            .field("item_id", &self.item_id)
            .field("state", &self.state)
            .field("elapsed_secs", &self.elapsed_secs)
            .field("required_secs", &self.required_secs)
            .field("completion_signaled", &self.completion_signaled)
            .finish_non_exhaustive()
    }
}

impl ElapsedTracker {
    pub fn builder(item_id: impl Into<String>, required_minutes: f64) -> TrackerBuilder {
        TrackerBuilder {
            item_id: item_id.into(),
            required_minutes,
            store: None,
            clock: None,
            on_time_complete: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == TrackerState::Running
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn required_secs(&self) -> f64 {
        self.required_secs
    }

    pub fn is_complete(&self) -> bool {
        self.elapsed_secs as f64 >= self.required_secs
    }

    pub fn progress_percent(&self) -> f64 {
        format::progress_percent(self.elapsed_secs, self.required_secs)
    }

    pub fn remaining_minutes(&self) -> u64 {
        format::remaining_minutes(self.elapsed_secs, self.required_secs)
    }

    /// True once any store operation has failed this session.
    pub fn persistence_degraded(&self) -> bool {
        self.persistence_degraded
    }

    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            item_id: self.item_id.clone(),
            state: self.state,
            elapsed_secs: self.elapsed_secs,
            required_secs: self.required_secs,
            is_complete: self.is_complete(),
            progress_pct: self.progress_percent(),
            remaining_minutes: self.remaining_minutes(),
            display: format::format_clock(self.elapsed_secs),
            at: Utc::now(),
        }
    }

    /// Completion found at load time or while pausing.
    pub fn take_pending_completion(&mut self) -> Option<Event> {
        self.pending_completion.take()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin accumulating from now.
    ///
    /// While already Running, whole seconds of the current session are folded
    /// into the accumulator before re-anchoring, so nothing is lost.
    pub fn start(&mut self) -> Option<Event> {
        let now = self.clock.now_ms();
        match self.session_start_ms {
            Some(start) if self.state == TrackerState::Running => {
                let session = now.saturating_sub(start) / 1000;
                self.paused_secs = (self.paused_secs + session).max(self.elapsed_secs);
                self.session_start_ms = Some(start + session * 1000);
            }
            _ => {
                self.session_start_ms = Some(now);
            }
        }
        self.state = TrackerState::Running;
        tracing::debug!(item_id = %self.item_id, elapsed_secs = self.elapsed_secs, "tracking started");
        Some(Event::TrackingStarted {
            item_id: self.item_id.clone(),
            elapsed_secs: self.elapsed_secs,
            at: Utc::now(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if self.state != TrackerState::Running {
            return None;
        }
        let session = self.session_secs();
        self.paused_secs = (self.paused_secs + session).max(self.elapsed_secs);
        self.elapsed_secs = self.paused_secs;
        self.session_start_ms = None;
        self.state = TrackerState::Idle;
        self.persist();
        if let Some(event) = self.check_completion() {
            self.pending_completion = Some(event);
        }
        tracing::debug!(item_id = %self.item_id, elapsed_secs = self.elapsed_secs, "tracking paused");
        Some(Event::TrackingPaused {
            item_id: self.item_id.clone(),
            elapsed_secs: self.elapsed_secs,
            at: Utc::now(),
        })
    }

    pub fn resume(&mut self) -> Option<Event> {
        if self.state != TrackerState::Idle {
            return None;
        }
        self.session_start_ms = Some(self.clock.now_ms());
        self.state = TrackerState::Running;
        tracing::debug!(item_id = %self.item_id, elapsed_secs = self.elapsed_secs, "tracking resumed");
        Some(Event::TrackingResumed {
            item_id: self.item_id.clone(),
            elapsed_secs: self.elapsed_secs,
            at: Utc::now(),
        })
    }

    /// Zero everything and forget the persisted entry. A reset item can
    /// complete again.
    pub fn reset(&mut self) -> Option<Event> {
        self.state = TrackerState::Idle;
        self.elapsed_secs = 0;
        self.paused_secs = 0;
        self.session_start_ms = None;
        self.completion_signaled = false;
        self.pending_completion = None;
        if let Some(key) = &self.key {
            if let Err(e) = self.store.remove(key) {
                self.note_store_failure("remove", &e);
            }
        }
        tracing::debug!(item_id = %self.item_id, "tracking reset");
        Some(Event::TrackingReset {
            item_id: self.item_id.clone(),
            at: Utc::now(),
        })
    }

    /// Call periodically. Returns `Some(Event::TimeCompleted)` on the first
    /// tick where the threshold holds.
    pub fn tick(&mut self) -> Option<Event> {
        if self.state != TrackerState::Running {
            return None;
        }
        let elapsed = self.paused_secs + self.session_secs();
        self.elapsed_secs = elapsed.max(self.elapsed_secs);
        self.persist();
        self.check_completion()
    }

    /// Stop the tracker for good. Pauses, persists and returns the final
    /// snapshot together with any completion still pending; the tracker
    /// cannot tick afterwards.
    pub fn dispose(mut self) -> Disposal {
        self.pause();
        tracing::debug!(item_id = %self.item_id, elapsed_secs = self.elapsed_secs, "tracker disposed");
        Disposal {
            completion: self.take_pending_completion(),
            snapshot: self.snapshot(),
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn session_secs(&self) -> u64 {
        self.session_start_ms
            .map(|start| self.clock.now_ms().saturating_sub(start) / 1000)
            .unwrap_or(0)
    }

    fn load(&mut self) -> u64 {
        let Some(key) = self.key.clone() else {
            return 0;
        };
        match self.store.get(&key) {
            Ok(Some(raw)) => parse_persisted(&raw).unwrap_or_else(|| {
                tracing::debug!(item_id = %self.item_id, value = %raw, "ignoring malformed persisted elapsed value");
                0
            }),
            Ok(None) => 0,
            Err(e) => {
                self.note_store_failure("get", &e);
                0
            }
        }
    }

    fn persist(&mut self) {
        let Some(key) = &self.key else {
            return;
        };
        if let Err(e) = self.store.set(key, &self.elapsed_secs.to_string()) {
            self.note_store_failure("set", &e);
        }
    }

    fn note_store_failure(&mut self, op: &str, err: &crate::error::StorageError) {
        if self.persistence_degraded {
            tracing::debug!(item_id = %self.item_id, op, error = %err, "tracker store operation failed");
        } else {
            tracing::warn!(item_id = %self.item_id, op, error = %err, "tracker store unavailable, continuing in memory");
            self.persistence_degraded = true;
        }
    }

    fn check_completion(&mut self) -> Option<Event> {
        if self.completion_signaled || !self.is_complete() {
            return None;
        }
        self.completion_signaled = true;
        let event = Event::TimeCompleted {
            item_id: self.item_id.clone(),
            elapsed_secs: self.elapsed_secs,
            required_secs: self.required_secs,
            at: Utc::now(),
        };
        tracing::info!(item_id = %self.item_id, elapsed_secs = self.elapsed_secs, "required time reached");
        if let Some(callback) = self.on_time_complete.as_mut() {
            callback(&event);
        }
        Some(event)
    }
}
