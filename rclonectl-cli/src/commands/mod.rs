pub mod rcd;
pub mod unit;

use std::path::Path;

use anyhow::{Context, Result};

use rclonectl_core::{Config, DaemonConfig};
use rclonectl_daemon::RcClient;

/// Load configuration and surface its diagnostics as warnings.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let (config, diagnostics) = Config::load(explicit).context("failed to load configuration")?;
    if let Some(path) = config.path() {
        tracing::debug!("config file path: {}", path.display());
    }
    for warning in diagnostics.warnings() {
        tracing::warn!("{warning}");
    }
    Ok(config)
}

pub fn daemon_config(config: &Config) -> Result<DaemonConfig> {
    DaemonConfig::from_source(config).context("invalid daemon configuration")
}

pub fn rc_client(daemon: &DaemonConfig) -> RcClient {
    RcClient::with_timeout(daemon.endpoint(), daemon.rc_timeout)
}
