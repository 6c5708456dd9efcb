//! Core error types for workout-reminder-core.
//!
//! Every backend failure maps onto one of a small set of kinds the controller
//! knows how to survive. Validation failures are rejected before anything is
//! written.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for workout-reminder-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The key-value store could not be read or written.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// The platform declined to show the reminder.
    #[error("Presentation failed: {0}")]
    PresentationFailed(String),

    /// The alarm backend rejected a schedule or cancel request.
    #[error("Scheduling failed for alarm '{alarm}': {message}")]
    SchedulingFailed { alarm: String, message: String },

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// Failures the controller logs and rides out until the next event.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CoreError::StorageUnavailable(_)
                | CoreError::PresentationFailed(_)
                | CoreError::SchedulingFailed { .. }
        )
    }
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

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be determined or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors. Raised before any write happens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Reminder interval outside the accepted range
    #[error("Interval must be between {min} and {max} minutes (got {value})")]
    IntervalOutOfRange { value: u32, min: u32, max: u32 },

    /// Custom workout text is blank after trimming
    #[error("Workout text cannot be empty")]
    EmptyWorkout,

    /// Custom workout text is too long
    #[error("Workout text is {len} characters long (max {max})")]
    WorkoutTooLong { len: usize, max: usize },

    /// Custom workout already present
    #[error("Workout already exists: {0}")]
    DuplicateWorkout(String),

    /// Out of bounds
    #[error("Index {index} out of bounds for {collection} (length: {len})")]
    OutOfBounds {
        collection: String,
        index: usize,
        len: usize,
    },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) if e.code == rusqlite::ErrorCode::DatabaseBusy => {
                CoreError::StorageUnavailable("database is busy".into())
            }
            rusqlite::Error::SqliteFailure(e, _msg)
                if e.code == rusqlite::ErrorCode::DatabaseLocked =>
            {
                CoreError::StorageUnavailable("database is locked".into())
            }
            _ => CoreError::StorageUnavailable(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
