//! Core error types for pomo-core.
//!
//! The five interval-level kinds (`NoIntervals`, `IntervalNotRunning`,
//! `IntervalCompleted`, `InvalidState`, `InvalidId`) are distinct variants so
//! callers can branch on them. Infrastructure failures are wrapped in their
//! own sub-hierarchies.

use std::path::PathBuf;
use thiserror::Error;

use crate::interval::IntervalState;

/// Core error type for pomo-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The store holds no intervals yet.
    #[error("no intervals")]
    NoIntervals,

    /// The operation needs an active countdown but none is running.
    #[error("interval not running")]
    IntervalNotRunning,

    /// The interval is done or cancelled and accepts no further commands.
    #[error("interval is completed or cancelled")]
    IntervalCompleted,

    /// The requested transition is not allowed from the current state.
    #[error("invalid state: cannot {operation} an interval that is {state}")]
    InvalidState {
        state: IntervalState,
        operation: &'static str,
    },

    /// No stored interval carries this id.
    #[error("invalid id: {0}")]
    InvalidId(i64),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

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

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// A stored row could not be mapped back to an interval
    #[error("Corrupt row {id}: {message}")]
    Corrupt { id: i64, message: String },

    /// The connection mutex was poisoned by a panicking writer
    #[error("Connection lock poisoned")]
    Poisoned,
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

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

// Helper implementations for converting from other error types

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked
                    || err.code == rusqlite::ErrorCode::DatabaseBusy
                {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(DatabaseError::from(err))
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
