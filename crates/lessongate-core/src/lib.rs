//! # lessongate Core Library
//!
//! Lesson progress gating for an online-learning platform: how long a learner
//! has actively spent on a lesson, and which lessons they may open next.
//! All operations are also exposed through the standalone `lessongate` CLI.
//!
//! ## Architecture
//!
//! - **Elapsed-Time Tracker**: a wall-clock stopwatch per content item that
//!   requires the caller to periodically invoke `tick()`; state is persisted
//!   through an injected key-value store
//! - **Tracker driver**: a tokio task owning one tracker and ticking it
//! - **Access Gate**: a pure function deciding sequential lesson unlocking
//! - **Storage**: SQLite/in-memory key-value stores and TOML configuration
//!
//! ## Key Components
//!
//! - [`ElapsedTracker`]: tracker state machine
//! - [`can_access`]: access gate decision
//! - [`KeyValueStore`]: persistence surface
//! - [`Config`]: application configuration management

pub mod clock;
pub mod error;
pub mod events;
pub mod format;
pub mod gate;
pub mod storage;
pub mod tracker;

pub use clock::{Clock, ManualClock, SystemClock, TokioClock};
pub use error::{ConfigError, CoreError, StorageError, TrackerError, ValidationError};
pub use events::Event;
pub use gate::{
    can_access, sidebar_entries, AccessContext, AccessDecision, Course, CourseProgress,
    LessonNode, ViewerRole,
};
pub use storage::{Config, KeyValueStore, MemoryStore, SqliteStore};
pub use tracker::{Disposal, ElapsedTracker, TrackerHandle, TrackerSet, TrackerState};
