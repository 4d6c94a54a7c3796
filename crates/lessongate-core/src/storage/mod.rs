mod config;
pub mod kv;
pub mod sqlite;

pub use config::{Config, LoggingConfig, StorageConfig, TrackingConfig};
pub use kv::{KeyValueStore, MemoryStore};
pub use sqlite::SqliteStore;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the lessongate data directory.
///
/// `LESSONGATE_DATA_DIR` wins when set. Otherwise `~/.config/lessongate[-dev]/`,
/// where the `-dev` suffix is selected with `LESSONGATE_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("LESSONGATE_DATA_DIR") {
        Some(explicit) => PathBuf::from(explicit),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("LESSONGATE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("lessongate-dev")
            } else {
                base_dir.join("lessongate")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
