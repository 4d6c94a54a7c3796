//! Core error types for lessongate-core.
//!
//! This module defines the error hierarchy using thiserror. Tracker
//! persistence failures never reach callers (they are logged and swallowed
//! inside the tracker), so `StorageError` mostly surfaces from the CLI and
//! from direct store access.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for lessongate-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors (reading course files)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Key-value store errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open the backing database
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Store is locked by another connection
    #[error("Store is locked")]
    Locked,

    /// Backend refused the operation (disabled storage, poisoned lock, ...)
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Errors raised by elapsed-time tracker construction and its driver.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackerError {
    /// Threshold must be a positive, finite number of minutes
    #[error("required minutes must be a positive number, got {0}")]
    InvalidRequiredMinutes(f64),

    /// The task owning the tracker has already shut down
    #[error("tracker task for '{0}' has stopped")]
    Stopped(String),
}

/// Validation errors for externally supplied course data.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Lesson id appears more than once in a course
    #[error("Duplicate lesson id '{0}' in course")]
    DuplicateLesson(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, _msg)
                if code.code == rusqlite::ErrorCode::DatabaseLocked
                    || code.code == rusqlite::ErrorCode::DatabaseBusy =>
            {
                StorageError::Locked
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
