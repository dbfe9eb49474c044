// =============================================================================
// zOS Sync - Utilities Module
// =============================================================================
//
// Project: zOS Sync - Sliding sync and presence services for the zOS chat client
// Author: zOS Chat Team
// Date: 2026-10-19
// Version: 0.4.0
// License: Apache 2.0 / MIT
//
// Description:
//   Tracing setup for hosts embedding the sync services.
//
// =============================================================================

use tracing_subscriber::{prelude::*, EnvFilter};
use zos_sync_core::{Result, SyncError};

/// Filter for `directive`, or `warn` when the directive does not parse
pub fn build_filter(directive: &str) -> EnvFilter {
    match EnvFilter::try_new(directive) {
        Ok(filter) => filter,
        Err(e) => {
            eprintln!("Invalid log filter {directive:?} ({e}), falling back to \"warn\"");
            EnvFilter::new("warn")
        }
    }
}

/// Installs the global tracing subscriber: an `EnvFilter` over a fmt layer
pub fn init_tracing(directive: &str) -> Result<()> {
    let subscriber = tracing_subscriber::Registry::default()
        .with(build_filter(directive))
        .with(tracing_subscriber::fmt::Layer::new());

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| SyncError::Config(format!("tracing already initialized: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn test_build_filter_keeps_valid_directive() {
        let filter = build_filter("debug");
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn test_build_filter_falls_back_to_warn() {
        let filter = build_filter("zos_sync=loudest");
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn test_global_subscriber_is_set_once() {
        let _ = init_tracing("info");
        assert!(matches!(init_tracing("info"), Err(SyncError::Config(_))));
    }
}
