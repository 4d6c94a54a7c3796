use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tracker::TrackerState;

/// Every tracker state change produces an Event.
/// Hosts forward them to the UI or to the progress API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TrackingStarted {
        item_id: String,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    TrackingPaused {
        item_id: String,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    TrackingResumed {
        item_id: String,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    TrackingReset {
        item_id: String,
        at: DateTime<Utc>,
    },
    /// Elapsed time reached the required threshold. Emitted once per
    /// false -> true transition of `is_complete`.
    TimeCompleted {
        item_id: String,
        elapsed_secs: u64,
        required_secs: f64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        item_id: String,
        state: TrackerState,
        elapsed_secs: u64,
        required_secs: f64,
        is_complete: bool,
        progress_pct: f64,
        remaining_minutes: u64,
        display: String,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn item_id(&self) -> &str {
        match self {
            Event::TrackingStarted { item_id, .. }
            | Event::TrackingPaused { item_id, .. }
            | Event::TrackingResumed { item_id, .. }
            | Event::TrackingReset { item_id, .. }
            | Event::TimeCompleted { item_id, .. }
            | Event::StateSnapshot { item_id, .. } => item_id,
        }
    }

    pub fn is_completion(&self) -> bool {
        matches!(self, Event::TimeCompleted { .. })
    }
}
