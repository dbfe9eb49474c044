// =============================================================================
// zOS Sync - Configuration Loading Module
// =============================================================================
//
// Project: zOS Sync - Sliding sync and presence services for the zOS chat client
// Author: zOS Chat Team
// Date: 2026-10-19
// Version: 0.4.0
// License: Apache 2.0 / MIT
//
// Description:
//   Layers the service configuration: built-in defaults, then an optional
//   TOML file, then `ZOS_SYNC_` environment variables. Nested keys are
//   separated by a double underscore in variable names, e.g.
//   `ZOS_SYNC_SLIDING_SYNC__PROXY_URL`.
//
// =============================================================================

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use tracing::info;
use zos_sync_core::{config::SyncConfig, Result, SyncError};

/// Prefix of the environment variables read by [`load`]
pub const ENV_PREFIX: &str = "ZOS_SYNC_";

fn figment(path: Option<&Path>) -> Result<Figment> {
    let mut figment = Figment::from(Serialized::defaults(SyncConfig::default()));

    if let Some(path) = path {
        if !path.exists() {
            return Err(SyncError::Config(format!(
                "config file {} does not exist",
                path.display()
            )));
        }
        info!("📁 Using configuration file: {}", path.display());
        figment = figment.merge(Toml::file(path));
    }

    Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
}

/// Loads and validates the configuration
pub fn load(path: Option<&Path>) -> Result<SyncConfig> {
    let config: SyncConfig = figment(path)?
        .extract()
        .map_err(|e| SyncError::Config(e.to_string()))?;

    config.validate()?;
    Ok(config)
}
