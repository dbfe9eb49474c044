// =============================================================================
// zOS Sync - Library Crate
// =============================================================================
//
// Project: zOS Sync - Sliding sync and presence services for the zOS chat client
// Author: zOS Chat Team
// Date: 2026-10-19
// Version: 0.4.0
// License: Apache 2.0 / MIT
//
// Description:
//   Sliding sync room subscriptions, room crawling and presence controllers
//   for the zOS chat client. The services configure and drive a Matrix SDK
//   through the traits in `zos_sync_core::traits`; they do not speak the
//   wire protocol themselves.
//
// =============================================================================

pub mod config;
pub mod service;
pub mod utils;

#[cfg(test)]
mod test_utils;

// Re-export common types
pub use ruma;
pub use tokio;
pub use tracing;

// Re-export workspace crates
pub use zos_sync_common as common;
pub use zos_sync_core as core;

pub use service::{
    presence::{is_eligible_for_presence, PresenceHeartbeat, PresencePoller, PresenceUpdate},
    sync::{RoomAppearance, SessionPhase, SubscriptionProfile, SyncSession},
};
pub use zos_sync_core::{config::SyncConfig, Result, SyncError};
