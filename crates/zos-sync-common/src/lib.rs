//! zOS Sync common types
//!
//! Shared error handling for the zOS Sync workspace.

pub mod error;

pub use error::{Result, SyncError};
