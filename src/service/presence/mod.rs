// =============================================================================
// zOS Sync - Presence Service Module
// =============================================================================
//
// Project: zOS Sync - Sliding sync and presence services for the zOS chat client
// Author: zOS Chat Team
// Date: 2026-10-19
// Version: 0.4.0
// License: Apache 2.0 / MIT
//
// Description:
//   Presence controllers: the heartbeat keeping our own presence online and
//   the poller reading other users' presence for the UI.
//
// =============================================================================

pub mod heartbeat;
pub mod poller;

pub use heartbeat::PresenceHeartbeat;
pub use poller::{is_eligible_for_presence, PresencePoller, PresenceUpdate};
