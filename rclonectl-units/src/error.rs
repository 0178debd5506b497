//! Error types for rclonectl-units.

use thiserror::Error;

use rclonectl_core::{ConfigError, UnitName};
use rclonectl_daemon::RcError;

/// All errors that can arise resolving, binding, or running a unit.
///
/// Daemon-side rejections are not errors; they come back as
/// [`JobOutcome::Failure`](crate::JobOutcome::Failure).
#[derive(Debug, Error)]
pub enum UnitError {
    #[error("unit not found: {name}")]
    UnitNotFound { name: UnitName },

    #[error("unit {name}: unsupported kind '{kind}'")]
    UnsupportedUnitKind { name: UnitName, kind: String },

    #[error("unit {name}: unsupported protocol '{protocol}'")]
    UnsupportedProtocol { name: UnitName, protocol: String },

    /// The liveness probe failed before the unit operation was attempted.
    #[error("no rclone remote control server answering on {url}")]
    DaemonUnreachable { url: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] RcError),
}
