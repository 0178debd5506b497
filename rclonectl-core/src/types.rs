//! Domain types for rclonectl.
//!
//! All path fields use `PathBuf`. Every typed view is built from a
//! [`ConfigSource`] and never mutates it.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ConfigSource;
use crate::error::ConfigError;

/// Section holding the daemon launch settings.
pub const RCLONE_SECTION: &str = "rclone";
/// Section holding settings of the controller itself.
pub const CTL_SECTION: &str = "rclone-ctl";
/// Prefix of unit sections: `[unit:<name>]`.
pub const UNIT_PREFIX: &str = "unit:";
/// Prefix of legacy service sections: `[service@<name>]`.
pub const LEGACY_SERVICE_PREFIX: &str = "service@";

pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_millis(3000);
pub const DEFAULT_RC_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed unit name, without the `unit:` / `service@` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitName(pub String);

impl fmt::Display for UnitName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for UnitName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UnitName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Serving protocols the daemon can be asked to run for a `service` unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Webdav,
}

impl Protocol {
    pub const SUPPORTED: &'static [Protocol] = &[Protocol::Webdav];

    /// Case-sensitive lookup by the name used in configuration and on the
    /// daemon's `serve` command line.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::SUPPORTED.iter().copied().find(|p| p.as_str() == name)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Webdav => "webdav",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Remote endpoint
// ---------------------------------------------------------------------------

/// The daemon's RC listener. Immutable once a client is built from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEndpoint {
    /// Always ends with `/`; commands are appended verbatim.
    pub base_url: String,
    pub user: String,
    pub pass: String,
}

impl RemoteEndpoint {
    /// Endpoint for an `host:port` RC address.
    pub fn from_addr(addr: &str, user: impl Into<String>, pass: impl Into<String>) -> Self {
        Self::new(format!("http://{addr}/"), user, pass)
    }

    pub fn new(base_url: impl Into<String>, user: impl Into<String>, pass: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            base_url,
            user: user.into(),
            pass: pass.into(),
        }
    }

    pub fn url_for(&self, command: &str) -> String {
        format!("{}{}", self.base_url, command.trim_start_matches('/'))
    }
}

// ---------------------------------------------------------------------------
// Daemon configuration
// ---------------------------------------------------------------------------

/// Everything the supervisor needs to launch, find and stop the daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonConfig {
    pub exec_file: PathBuf,
    pub cache_dir: PathBuf,
    pub rc_addr: String,
    pub rc_user: String,
    pub rc_pass: String,
    pub pid_file: PathBuf,
    /// How long `start` waits before deciding the daemon survived its launch.
    pub grace_period: Duration,
    /// Read/write cap applied by the RC transport.
    pub rc_timeout: Duration,
}

impl DaemonConfig {
    pub fn from_source(source: &impl ConfigSource) -> Result<Self, ConfigError> {
        Ok(Self {
            exec_file: PathBuf::from(source.get(RCLONE_SECTION, "exec_file")?),
            cache_dir: PathBuf::from(source.get(RCLONE_SECTION, "cache_dir")?),
            rc_addr: source.get(RCLONE_SECTION, "rc_addr")?,
            rc_user: source.get(RCLONE_SECTION, "rc_user")?,
            rc_pass: source.get(RCLONE_SECTION, "rc_pass")?,
            pid_file: PathBuf::from(source.get(CTL_SECTION, "pid_file")?),
            grace_period: optional_duration(source, "grace_period_ms", Duration::from_millis)?
                .unwrap_or(DEFAULT_GRACE_PERIOD),
            rc_timeout: nonzero(
                "rc_timeout_secs",
                optional_duration(source, "rc_timeout_secs", Duration::from_secs)?,
            )?
            .unwrap_or(DEFAULT_RC_TIMEOUT),
        })
    }

    pub fn endpoint(&self) -> RemoteEndpoint {
        RemoteEndpoint::from_addr(&self.rc_addr, &self.rc_user, &self.rc_pass)
    }

    /// Arguments passed to `exec_file`, in order.
    pub fn launch_args(&self) -> Vec<String> {
        vec![
            "rcd".to_owned(),
            format!("--cache-dir={}", self.cache_dir.display()),
            format!("--rc-addr={}", self.rc_addr),
            format!("--rc-user={}", self.rc_user),
            format!("--rc-pass={}", self.rc_pass),
        ]
    }
}

fn optional_duration(
    source: &impl ConfigSource,
    key: &str,
    unit: fn(u64) -> Duration,
) -> Result<Option<Duration>, ConfigError> {
    let raw = match source.get(CTL_SECTION, key) {
        Ok(raw) => raw,
        Err(ConfigError::MissingKey { .. }) => return Ok(None),
        Err(err) => return Err(err),
    };
    raw.trim()
        .parse::<u64>()
        .map(|v| Some(unit(v)))
        .map_err(|e| ConfigError::InvalidValue {
            section: CTL_SECTION.to_owned(),
            key: key.to_owned(),
            value: raw.clone(),
            reason: e.to_string(),
        })
}

/// A zero socket timeout is rejected by the transport on every call.
fn nonzero(key: &str, value: Option<Duration>) -> Result<Option<Duration>, ConfigError> {
    match value {
        Some(duration) if duration.is_zero() => Err(ConfigError::InvalidValue {
            section: CTL_SECTION.to_owned(),
            key: key.to_owned(),
            value: "0".to_owned(),
            reason: "must be greater than zero".to_owned(),
        }),
        other => Ok(other),
    }
}

// ---------------------------------------------------------------------------
// Unit configuration
// ---------------------------------------------------------------------------

/// The key/value declaration of one unit, already interpolated.
///
/// Owned by configuration storage; the dispatcher only reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitConfig {
    pub name: UnitName,
    /// The section the unit was declared in, e.g. `unit:webdav1`.
    pub section: String,
    pub values: BTreeMap<String, String>,
}

impl UnitConfig {
    pub fn get(&self, key: &str) -> Result<&str, ConfigError> {
        self.values
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| ConfigError::missing(&self.section, key))
    }

    pub fn get_opt(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Declared in a `[service@<name>]` section rather than `[unit:<name>]`.
    pub fn is_legacy(&self) -> bool {
        self.section.starts_with(LEGACY_SERVICE_PREFIX)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
