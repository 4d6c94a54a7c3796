//! Elapsed-time tracking commands for CLI.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Subcommand;
use lessongate_core::storage::{Config, SqliteStore};
use lessongate_core::tracker::{self, ElapsedTracker, STORAGE_KEY_PREFIX};
use lessongate_core::{format, Event, KeyValueStore, SystemClock};
use serde::Serialize;
use tokio::sync::mpsc;

#[derive(Subcommand)]
pub enum TrackAction {
    /// Track time on an item until interrupted (Ctrl-C), printing events as JSON lines
    Watch {
        /// Item (lesson) ID
        item_id: String,
        /// Required minutes (default: the lesson's threshold in --course, then
        /// tracking.default_required_minutes)
        #[arg(long)]
        required_minutes: Option<f64>,
        /// Course JSON file supplying the lesson's required minutes
        #[arg(long)]
        course: Option<PathBuf>,
        /// Stop as soon as the required time is reached
        #[arg(long)]
        exit_on_complete: bool,
    },
    /// Print the persisted state of an item as JSON
    Status {
        /// Item (lesson) ID
        item_id: String,
        /// Required minutes (default: the lesson's threshold in --course, then
        /// tracking.default_required_minutes)
        #[arg(long)]
        required_minutes: Option<f64>,
        /// Course JSON file supplying the lesson's required minutes
        #[arg(long)]
        course: Option<PathBuf>,
    },
    /// Forget the persisted time of an item
    Reset {
        /// Item (lesson) ID
        item_id: String,
    },
    /// List items with persisted time
    List,
}

#[derive(Serialize)]
struct TrackedItemRow {
    item_id: String,
    elapsed_secs: Option<u64>,
    display: Option<String>,
}

fn open_store(config: &Config) -> Result<Arc<SqliteStore>, Box<dyn std::error::Error>> {
    Ok(Arc::new(SqliteStore::open(&config.storage.database_file)?))
}

fn build_tracker(
    store: Arc<SqliteStore>,
    item_id: &str,
    required_minutes: f64,
) -> Result<ElapsedTracker, Box<dyn std::error::Error>> {
    Ok(ElapsedTracker::builder(item_id, required_minutes)
        .store(store)
        .clock(Arc::new(SystemClock))
        .build()?)
}

/// `--required-minutes` wins, then the lesson's own threshold, then config.
fn resolve_minutes(
    config: &Config,
    item_id: &str,
    explicit: Option<f64>,
    course: Option<&Path>,
) -> Result<f64, Box<dyn std::error::Error>> {
    if let Some(minutes) = explicit {
        return Ok(minutes);
    }
    if let Some(path) = course {
        if let Some(minutes) = super::gate::load_course(path)?.required_minutes_for(item_id) {
            return Ok(minutes);
        }
    }
    Ok(config.tracking.default_required_minutes)
}

fn print_event(event: &Event) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string(event)?);
    Ok(())
}

async fn watch(
    tracker: ElapsedTracker,
    tick_interval: Duration,
    exit_on_complete: bool,
) -> Result<Event, Box<dyn std::error::Error>> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = tracker::spawn(tracker, tick_interval, tx);
    handle.start().await?;

    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);

    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else { break };
                print_event(&event)?;
                if exit_on_complete && event.is_completion() {
                    break;
                }
            }
            _ = &mut interrupted => {
                tracing::info!(item_id = %handle.item_id(), "interrupted, stopping tracker");
                break;
            }
        }
    }

    let snapshot = handle.dispose().await?;
    // Completion reached by the closing pause arrives after the loop.
    while let Ok(event) = rx.try_recv() {
        print_event(&event)?;
    }
    Ok(snapshot)
}

pub fn run(action: TrackAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();

    match action {
        TrackAction::Watch {
            item_id,
            required_minutes,
            course,
            exit_on_complete,
        } => {
            let minutes = resolve_minutes(&config, &item_id, required_minutes, course.as_deref())?;
            let tracker = build_tracker(open_store(&config)?, &item_id, minutes)?;
            let interval = Duration::from_millis(config.tracking.tick_interval_ms);
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            let snapshot = runtime.block_on(watch(tracker, interval, exit_on_complete))?;
            print_event(&snapshot)?;
        }
        TrackAction::Status {
            item_id,
            required_minutes,
            course,
        } => {
            let minutes = resolve_minutes(&config, &item_id, required_minutes, course.as_deref())?;
            let tracker = build_tracker(open_store(&config)?, &item_id, minutes)?;
            println!("{}", serde_json::to_string_pretty(&tracker.snapshot())?);
        }
        TrackAction::Reset { item_id } => {
            let minutes = config.tracking.default_required_minutes;
            let mut tracker = build_tracker(open_store(&config)?, &item_id, minutes)?;
            if let Some(event) = tracker.reset() {
                println!("{}", serde_json::to_string_pretty(&event)?);
            }
        }
        TrackAction::List => {
            let store = open_store(&config)?;
            let mut rows = Vec::new();
            for key in store.keys_with_prefix(STORAGE_KEY_PREFIX)? {
                let elapsed = store
                    .get(&key)?
                    .as_deref()
                    .and_then(tracker::parse_persisted);
                rows.push(TrackedItemRow {
                    item_id: key[STORAGE_KEY_PREFIX.len()..].to_string(),
                    elapsed_secs: elapsed,
                    display: elapsed.map(format::format_clock),
                });
            }
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }
    Ok(())
}
