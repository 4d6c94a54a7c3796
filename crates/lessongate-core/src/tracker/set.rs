//! Several trackers hosted by one synchronous caller (e.g. a page showing a
//! lesson plus prefetched syllabus entries). Each tracker is attached and
//! detached on its own; detaching one never touches the others.

use std::collections::BTreeMap;

use super::engine::{Disposal, ElapsedTracker, TrackerBuilder};
use crate::error::TrackerError;
use crate::events::Event;

#[derive(Debug, Default)]
pub struct TrackerSet {
    trackers: BTreeMap<String, ElapsedTracker>,
}

impl TrackerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build and attach a tracker.
    ///
    /// A tracker already attached under the same item id is disposed (and
    /// its time persisted) before the new one loads, so the new tracker
    /// resumes from the saved total. Returns the previous tracker's disposal.
    ///
    /// # Errors
    /// Propagates build errors. The previous tracker stays disposed.
    pub fn attach(&mut self, builder: TrackerBuilder) -> Result<Option<Disposal>, TrackerError> {
        let previous = self
            .trackers
            .remove(builder.item_id())
            .map(ElapsedTracker::dispose);
        let tracker = builder.build()?;
        self.trackers.insert(tracker.item_id().to_string(), tracker);
        Ok(previous)
    }

    /// Dispose one tracker.
    pub fn detach(&mut self, item_id: &str) -> Option<Disposal> {
        self.trackers.remove(item_id).map(ElapsedTracker::dispose)
    }

    pub fn get(&self, item_id: &str) -> Option<&ElapsedTracker> {
        self.trackers.get(item_id)
    }

    pub fn get_mut(&mut self, item_id: &str) -> Option<&mut ElapsedTracker> {
        self.trackers.get_mut(item_id)
    }

    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }

    /// Tick every tracker, collecting completion events (in item id order).
    /// Completions found at load time or on pause are reported here too.
    pub fn tick_all(&mut self) -> Vec<Event> {
        self.trackers
            .values_mut()
            .filter_map(|tracker| {
                let ticked = tracker.tick();
                tracker.take_pending_completion().or(ticked)
            })
            .collect()
    }

    /// Dispose everything, e.g. when the host view goes away.
    pub fn dispose_all(&mut self) -> Vec<Disposal> {
        std::mem::take(&mut self.trackers)
            .into_values()
            .map(ElapsedTracker::dispose)
            .collect()
    }
}
