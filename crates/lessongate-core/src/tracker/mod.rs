pub mod driver;
mod engine;
mod set;

pub use driver::{spawn, TrackerHandle};
pub use engine::{
    parse_persisted, storage_key, CompletionCallback, Disposal, ElapsedTracker, TrackerBuilder,
    TrackerState, STORAGE_KEY_PREFIX,
};
pub use set::TrackerSet;
