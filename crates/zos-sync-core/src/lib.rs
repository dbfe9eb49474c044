//! zOS Sync Core Library
//!
//! Types, collaborator traits and configuration shared by the zOS Sync
//! services.
//!
//! # Features
//! - Sliding sync list and room subscription shapes
//! - Traits over the Matrix SDK the services drive
//! - Configuration with defaults for every knob
//!
//! # Examples
//! ```rust
//! use zos_sync_core::{config::SyncConfig, Result};
//!
//! fn example() -> Result<()> {
//!     let config = SyncConfig::default();
//!     config.validate()?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod traits;
pub mod types;

pub use zos_sync_common::{Result, SyncError};
