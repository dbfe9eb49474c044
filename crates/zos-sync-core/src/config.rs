//! Configuration module for zOS Sync
//!
//! Timing and sizing knobs for the sliding sync session, the room crawl and
//! the presence controllers. Every field has a default, so an empty file (or
//! no file at all) yields a working configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Result, SyncError};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Sliding sync session and crawl settings
    pub sliding_sync: SlidingSyncConfig,

    /// Presence heartbeat and poller settings
    pub presence: PresenceConfig,

    /// `tracing` filter directive
    pub log: LogConfig,
}

/// Sliding sync settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlidingSyncConfig {
    /// Sliding sync endpoint; the client base URL is used when unset
    pub proxy_url: Option<String>,

    /// Long-poll timeout for a sync request. Kept under the 30s request cap
    /// of the hosting platform, the SDK adds its own 10s buffer on top.
    pub timeout_ms: u64,

    /// How far a list range grows per crawl step
    pub crawl_batch_size: u64,

    /// Pause after each completed cycle before the crawl looks at counts
    pub crawl_request_gap_ms: u64,

    /// How long `add_room_to_sync` waits for an unknown room to appear
    pub room_wait_timeout_ms: u64,
}

impl Default for SlidingSyncConfig {
    fn default() -> Self {
        Self {
            proxy_url: None,
            timeout_ms: 19_000,
            crawl_batch_size: 50,
            crawl_request_gap_ms: 50,
            room_wait_timeout_ms: 30_000,
        }
    }
}

impl SlidingSyncConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn crawl_request_gap(&self) -> Duration {
        Duration::from_millis(self.crawl_request_gap_ms)
    }

    pub fn room_wait_timeout(&self) -> Duration {
        Duration::from_millis(self.room_wait_timeout_ms)
    }
}

/// Presence settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceConfig {
    /// Interval between heartbeat checks of our own presence
    pub heartbeat_interval_ms: u64,

    /// Republish when our last activity is older than this
    pub stale_threshold_ms: u64,

    /// Interval between polls of other users' presence
    pub poll_interval_ms: u64,

    /// How long a polled reading stays fresh
    pub poll_ttl_ms: u64,

    /// Users active within this window count as online
    pub recent_activity_window_ms: u64,

    /// Presence requests in flight at once
    pub max_concurrency: usize,

    /// Maximum users polled
    pub max_targets: usize,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_ms: 30_000,
            stale_threshold_ms: 30_000,
            poll_interval_ms: 30_000,
            poll_ttl_ms: 60_000,
            recent_activity_window_ms: 120_000,
            max_concurrency: 10,
            max_targets: 500,
        }
    }
}

impl PresenceConfig {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    pub fn stale_threshold(&self) -> Duration {
        Duration::from_millis(self.stale_threshold_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn poll_ttl(&self) -> Duration {
        Duration::from_millis(self.poll_ttl_ms)
    }

    pub fn recent_activity_window(&self) -> Duration {
        Duration::from_millis(self.recent_activity_window_ms)
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive, e.g. `info,zos_sync=debug`
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl SyncConfig {
    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        let sliding_sync = &self.sliding_sync;
        if sliding_sync.crawl_batch_size == 0 {
            return Err(SyncError::InvalidConfig(
                "sliding_sync.crawl_batch_size must be greater than zero".into(),
            ));
        }
        if sliding_sync.timeout_ms == 0 {
            return Err(SyncError::InvalidConfig(
                "sliding_sync.timeout_ms must be greater than zero".into(),
            ));
        }
        if let Some(url) = &sliding_sync.proxy_url {
            if url.trim().is_empty() {
                return Err(SyncError::InvalidConfig(
                    "sliding_sync.proxy_url cannot be empty".into(),
                ));
            }
        }

        let presence = &self.presence;
        if presence.heartbeat_interval_ms == 0 || presence.poll_interval_ms == 0 {
            return Err(SyncError::InvalidConfig(
                "presence intervals must be greater than zero".into(),
            ));
        }
        if presence.max_concurrency == 0 {
            return Err(SyncError::InvalidConfig(
                "presence.max_concurrency must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}
