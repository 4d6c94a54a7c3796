//! Async driver that confines one tracker to one tokio task.
//!
//! Ticks and control commands are serialised through the task's select loop,
//! so no tick ever runs concurrently with a command on the same tracker.
//! Dropping the handle (or calling `dispose`) closes the command channel; the
//! task then disposes the tracker and exits, and no tick fires afterwards.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::engine::ElapsedTracker;
use crate::error::TrackerError;
use crate::events::Event;

const COMMAND_BUFFER: usize = 16;

enum Command {
    Start,
    Pause,
    Resume,
    Reset,
    Snapshot(oneshot::Sender<Event>),
}

/// Handle to a running tracker task.
pub struct TrackerHandle {
    item_id: String,
    commands: mpsc::Sender<Command>,
    task: JoinHandle<Event>,
}

/// Spawn a task that owns `tracker` and ticks it every `tick_interval`.
///
/// Every event the tracker produces (commands, completion) is forwarded to
/// `events`, including a completion reached by the closing pause; a closed
/// receiver is ignored.
pub fn spawn(
    tracker: ElapsedTracker,
    tick_interval: Duration,
    events: mpsc::UnboundedSender<Event>,
) -> TrackerHandle {
    let item_id = tracker.item_id().to_string();
    let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
    let task = tokio::spawn(run(tracker, tick_interval, rx, events));
    TrackerHandle {
        item_id,
        commands: tx,
        task,
    }
}

async fn run(
    mut tracker: ElapsedTracker,
    tick_interval: Duration,
    mut commands: mpsc::Receiver<Command>,
    events: mpsc::UnboundedSender<Event>,
) -> Event {
    if let Some(event) = tracker.take_pending_completion() {
        let _ = events.send(event);
    }

    let mut ticker = tokio::time::interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else {
                    break;
                };
                let event = match command {
                    Command::Start => tracker.start(),
                    Command::Pause => tracker.pause(),
                    Command::Resume => tracker.resume(),
                    Command::Reset => tracker.reset(),
                    Command::Snapshot(reply) => {
                        let _ = reply.send(tracker.snapshot());
                        None
                    }
                };
                if let Some(event) = event {
                    let _ = events.send(event);
                }
                if let Some(event) = tracker.take_pending_completion() {
                    let _ = events.send(event);
                }
            }
            _ = ticker.tick() => {
                if let Some(event) = tracker.tick() {
                    let _ = events.send(event);
                }
            }
        }
    }

    tracing::debug!(item_id = %tracker.item_id(), "tracker task stopping");
    let disposal = tracker.dispose();
    if let Some(event) = disposal.completion {
        let _ = events.send(event);
    }
    disposal.snapshot
}

impl TrackerHandle {
    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub async fn start(&self) -> Result<(), TrackerError> {
        self.send(Command::Start).await
    }

    pub async fn pause(&self) -> Result<(), TrackerError> {
        self.send(Command::Pause).await
    }

    pub async fn resume(&self) -> Result<(), TrackerError> {
        self.send(Command::Resume).await
    }

    pub async fn reset(&self) -> Result<(), TrackerError> {
        self.send(Command::Reset).await
    }

    pub async fn snapshot(&self) -> Result<Event, TrackerError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot(reply)).await?;
        rx.await.map_err(|_| self.stopped())
    }

    /// Stop the task and return the tracker's final snapshot.
    pub async fn dispose(self) -> Result<Event, TrackerError> {
        let TrackerHandle {
            item_id,
            commands,
            task,
        } = self;
        drop(commands);
        task.await.map_err(|_| TrackerError::Stopped(item_id))
    }

    async fn send(&self, command: Command) -> Result<(), TrackerError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| self.stopped())
    }

    fn stopped(&self) -> TrackerError {
        TrackerError::Stopped(self.item_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::TokioClock;
    use crate::storage::{KeyValueStore, MemoryStore};
    use std::sync::Arc;

    fn tracker(item_id: &str, minutes: f64, store: Arc<MemoryStore>) -> ElapsedTracker {
        ElapsedTracker::builder(item_id, minutes)
            .store(store)
            .clock(Arc::new(TokioClock::new()))
            .build()
            .unwrap()
    }

    async fn next_completion(rx: &mut mpsc::UnboundedReceiver<Event>) -> Option<Event> {
        while let Some(event) = rx.recv().await {
            if event.is_completion() {
                return Some(event);
            }
        }
        None
    }

    #[tokio::test(start_paused = true)]
    async fn completes_after_required_time() {
        let store = Arc::new(MemoryStore::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = spawn(tracker("lesson-1", 0.1, store.clone()), Duration::from_secs(1), tx);
        handle.start().await.unwrap();

        let event = tokio::time::timeout(Duration::from_secs(30), next_completion(&mut rx))
            .await
            .expect("completion within 30s")
            .expect("event stream open");
        assert_eq!(event.item_id(), "lesson-1");

        let snapshot = handle.dispose().await.unwrap();
        match snapshot {
            Event::StateSnapshot {
                is_complete,
                elapsed_secs,
                ..
            } => {
                assert!(is_complete);
                assert!(elapsed_secs >= 6);
            }
            other => panic!("Expected StateSnapshot, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn no_ticks_after_dispose() {
        let store = Arc::new(MemoryStore::new());
        let (tx, _rx) = mpsc::unbounded_channel();
        let handle = spawn(tracker("lesson-2", 5.0, store.clone()), Duration::from_secs(1), tx);
        handle.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(3_500)).await;
        handle.dispose().await.unwrap();

        let persisted = store.get("time-tracking-lesson-2").unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(store.get("time-tracking-lesson-2").unwrap(), persisted);
        assert_eq!(persisted.as_deref(), Some("3"));
    }

    #[tokio::test(start_paused = true)]
    async fn trackers_dispose_independently() {
        let store = Arc::new(MemoryStore::new());
        let (tx, _rx) = mpsc::unbounded_channel();
        let first = spawn(tracker("a", 5.0, store.clone()), Duration::from_secs(1), tx.clone());
        let second = spawn(tracker("b", 5.0, store.clone()), Duration::from_secs(1), tx);
        first.start().await.unwrap();
        second.start().await.unwrap();

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        first.dispose().await.unwrap();
        tokio::time::sleep(Duration::from_secs(3)).await;

        assert_eq!(store.get("time-tracking-a").unwrap().as_deref(), Some("2"));
        match second.snapshot().await.unwrap() {
            Event::StateSnapshot { elapsed_secs, .. } => assert_eq!(elapsed_secs, 5),
            other => panic!("Expected StateSnapshot, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn completion_reached_by_dispose_is_delivered() {
        let store = Arc::new(MemoryStore::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = spawn(tracker("slow-tick", 0.1, store.clone()), Duration::from_secs(10), tx);
        handle.start().await.unwrap();
        tokio::time::sleep(Duration::from_secs(7)).await;

        match handle.dispose().await.unwrap() {
            Event::StateSnapshot {
                is_complete,
                elapsed_secs,
                ..
            } => {
                assert!(is_complete);
                assert_eq!(elapsed_secs, 7);
            }
            other => panic!("Expected StateSnapshot, got {other:?}"),
        }

        let mut completions = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if event.is_completion() {
                completions.push(event);
            }
        }
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].item_id(), "slow-tick");
    }

    #[tokio::test(start_paused = true)]
    async fn pause_and_reset_are_forwarded() {
        let store = Arc::new(MemoryStore::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = spawn(tracker("c", 5.0, store.clone()), Duration::from_secs(1), tx);
        handle.start().await.unwrap();
        handle.pause().await.unwrap();
        handle.reset().await.unwrap();
        let _ = handle.snapshot().await.unwrap();

        let mut kinds = Vec::new();
        while let Ok(event) = rx.try_recv() {
            kinds.push(match event {
                Event::TrackingStarted { .. } => "started",
                Event::TrackingPaused { .. } => "paused",
                Event::TrackingReset { .. } => "reset",
                _ => "other",
            });
        }
        assert_eq!(kinds, vec!["started", "paused", "reset"]);
        assert!(store.get("time-tracking-c").unwrap().is_none());
    }
}
