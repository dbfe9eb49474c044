//! Error types for zOS Sync
//!
//! Every operation in the sliding sync and presence services reports failures
//! through [`SyncError`]. Configuration and connection failures surface to the
//! caller of `setup`; crawl and presence failures are contained in their own
//! controllers and only show up in logs.

use std::io;
use thiserror::Error;

/// zOS Sync error types
#[derive(Debug, Error)]
pub enum SyncError {
    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration loaded but holds values the services cannot run with
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The sliding sync connection could not be created
    #[error("Connection error: {0}")]
    Connection(String),

    /// A bounded wait ran out
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// The session (or the client feeding it) went away while a caller was waiting
    #[error("Sync session closed: {0}")]
    SessionClosed(String),

    /// Reading or publishing presence failed
    #[error("Presence error: {0}")]
    Presence(String),

    /// Malformed identifiers or input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for zOS Sync operations
pub type Result<T> = std::result::Result<T, SyncError>;

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Serialization(err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for SyncError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        SyncError::Timeout(err.to_string())
    }
}

impl From<ruma::IdParseError> for SyncError {
    fn from(err: ruma::IdParseError) -> Self {
        SyncError::Validation(err.to_string())
    }
}
