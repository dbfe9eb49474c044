// =============================================================================
// zOS Sync - Services Module
// =============================================================================
//
// Project: zOS Sync - Sliding sync and presence services for the zOS chat client
// Author: zOS Chat Team
// Date: 2026-10-19
// Version: 0.4.0
// License: Apache 2.0 / MIT
//
// Description:
//   Client-side services driving the Matrix SDK: sliding sync and presence.
//
// =============================================================================

pub mod presence;
pub mod sync;
