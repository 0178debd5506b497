//! Resolving a unit name to its declaration and binding it to a handler.
//!
//! Declarations live in `[unit:<name>]` sections:
//!
//! ```ini
//! [unit:webdav1]
//! kind = service
//! protocol = webdav
//! user = a
//! pass = b
//! addr = 0.0.0.0:8080
//! remote_path = remote:path
//! ```
//!
//! The older `[service@<name>]` form is still read; there `type` names the
//! protocol and the kind is always `service`.

use std::collections::BTreeMap;

use rclonectl_core::types::{LEGACY_SERVICE_PREFIX, UNIT_PREFIX};
use rclonectl_core::{ConfigError, ConfigSource, UnitConfig, UnitName};
use rclonectl_daemon::RemoteControl;

use crate::error::UnitError;
use crate::outcome::JobOutcome;
use crate::protocol::ServeHandler;

/// What a bound unit can do.
pub trait Lifecycle {
    fn start(&self, rc: &dyn RemoteControl) -> Result<JobOutcome, UnitError>;
    fn stop(&self, rc: &dyn RemoteControl) -> Result<JobOutcome, UnitError>;
}

/// Mount units are declared but have no daemon-side implementation yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountHandler {
    pub unit: UnitName,
}

impl Lifecycle for MountHandler {
    fn start(&self, _rc: &dyn RemoteControl) -> Result<JobOutcome, UnitError> {
        tracing::warn!(unit = %self.unit, "mount units are not implemented");
        Ok(JobOutcome::not_implemented())
    }

    fn stop(&self, _rc: &dyn RemoteControl) -> Result<JobOutcome, UnitError> {
        tracing::warn!(unit = %self.unit, "mount units are not implemented");
        Ok(JobOutcome::not_implemented())
    }
}

/// Closed set of unit kinds, each carrying its handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitKind {
    Service(ServeHandler),
    Mount(MountHandler),
}

impl UnitKind {
    pub fn label(&self) -> &'static str {
        match self {
            UnitKind::Service(_) => "service",
            UnitKind::Mount(_) => "mount",
        }
    }

    fn handler(&self) -> &dyn Lifecycle {
        match self {
            UnitKind::Service(handler) => handler,
            UnitKind::Mount(handler) => handler,
        }
    }
}

/// A resolved and bound unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub config: UnitConfig,
    pub kind: UnitKind,
}

impl Unit {
    pub fn name(&self) -> &UnitName {
        &self.config.name
    }

    /// `(name, kind)` for log lines and listings.
    pub fn describe(&self) -> (&UnitName, &'static str) {
        (self.name(), self.kind.label())
    }

    /// Fails with `DaemonUnreachable` without calling the handler when the
    /// liveness probe fails.
    pub fn start(&self, rc: &dyn RemoteControl) -> Result<JobOutcome, UnitError> {
        ensure_alive(rc)?;
        self.kind.handler().start(rc)
    }

    pub fn stop(&self, rc: &dyn RemoteControl) -> Result<JobOutcome, UnitError> {
        ensure_alive(rc)?;
        self.kind.handler().stop(rc)
    }
}

/// Find the declaration of `name`. Matching is exact.
///
/// `[unit:<name>]` takes precedence over `[service@<name>]`.
pub fn resolve(name: &UnitName, source: &impl ConfigSource) -> Result<UnitConfig, UnitError> {
    if name.0.is_empty() {
        return Err(UnitError::UnitNotFound { name: name.clone() });
    }

    let section = [UNIT_PREFIX, LEGACY_SERVICE_PREFIX]
        .iter()
        .map(|prefix| format!("{prefix}{name}"))
        .find(|section| source.has_section(section))
        .ok_or_else(|| UnitError::UnitNotFound { name: name.clone() })?;

    let mut values = BTreeMap::new();
    for key in source.keys(&section) {
        let value = source.get(&section, &key)?;
        values.insert(key, value);
    }

    tracing::debug!(unit = %name, %section, "resolved unit");
    Ok(UnitConfig {
        name: name.clone(),
        section,
        values,
    })
}

/// Pick the handler for a declaration by its kind.
pub fn bind(config: UnitConfig) -> Result<Unit, UnitError> {
    let kind = if config.is_legacy() {
        let protocol = config
            .get_opt("type")
            .or_else(|| config.get_opt("protocol"))
            .ok_or_else(|| ConfigError::missing(&config.section, "type"))?;
        UnitKind::Service(ServeHandler::from_config(&config, protocol)?)
    } else {
        match (config.get_opt("kind"), config.get_opt("protocol")) {
            (Some("service"), Some(protocol)) | (None, Some(protocol)) => {
                UnitKind::Service(ServeHandler::from_config(&config, protocol)?)
            }
            (Some("service"), None) => {
                return Err(ConfigError::missing(&config.section, "protocol").into());
            }
            (Some("mount"), _) => UnitKind::Mount(MountHandler {
                unit: config.name.clone(),
            }),
            (Some(other), _) => {
                return Err(UnitError::UnsupportedUnitKind {
                    name: config.name.clone(),
                    kind: other.to_owned(),
                })
            }
            (None, None) => return Err(ConfigError::missing(&config.section, "kind").into()),
        }
    };

    Ok(Unit { config, kind })
}

fn ensure_alive(rc: &dyn RemoteControl) -> Result<(), UnitError> {
    if rc.check_alive() {
        return Ok(());
    }
    tracing::error!(url = rc.base_url(), "not a rclone remote control server");
    Err(UnitError::DaemonUnreachable {
        url: rc.base_url().to_owned(),
    })
}
