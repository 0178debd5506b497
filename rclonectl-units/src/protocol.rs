//! Protocol handlers: a `service` unit becomes an asynchronous `serve` job.
//!
//! ```text
//! POST core/command
//! {"command": "serve",
//!  "arg": [<protocol>, "--user=<user>", "--pass=<pass>", "--addr=<addr>", <remote_path>],
//!  "_async": true}
//! ```

use serde::Serialize;
use serde_json::{json, Value};

use rclonectl_core::{Protocol, UnitConfig, UnitName};
use rclonectl_daemon::RemoteControl;

use crate::error::UnitError;
use crate::outcome::JobOutcome;
use crate::unit::Lifecycle;

/// Generic command runner on the daemon side.
pub const CORE_COMMAND: &str = "core/command";

/// One RC call: the command path and its JSON parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RcRequest {
    pub command: String,
    pub parameters: Value,
}

impl RcRequest {
    pub fn send(&self, rc: &dyn RemoteControl) -> Result<Value, UnitError> {
        Ok(rc.send(&self.command, &self.parameters)?)
    }
}

/// Serves a remote path over one of the supported protocols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeHandler {
    pub unit: UnitName,
    pub protocol: Protocol,
    pub user: String,
    pub pass: String,
    pub addr: String,
    pub remote_path: String,
}

impl ServeHandler {
    /// Fails with `UnsupportedProtocol` before any required key is read.
    pub fn from_config(unit: &UnitConfig, protocol: &str) -> Result<Self, UnitError> {
        let protocol =
            Protocol::from_name(protocol).ok_or_else(|| UnitError::UnsupportedProtocol {
                name: unit.name.clone(),
                protocol: protocol.to_owned(),
            })?;

        Ok(Self {
            unit: unit.name.clone(),
            protocol,
            user: unit.get("user")?.to_owned(),
            pass: unit.get("pass")?.to_owned(),
            addr: unit.get("addr")?.to_owned(),
            remote_path: unit.get("remote_path")?.to_owned(),
        })
    }

    /// The `serve` argument list, in the order the daemon expects.
    pub fn serve_args(&self) -> Vec<String> {
        vec![
            self.protocol.as_str().to_owned(),
            format!("--user={}", self.user),
            format!("--pass={}", self.pass),
            format!("--addr={}", self.addr),
            self.remote_path.clone(),
        ]
    }

    pub fn build_serve_command(&self) -> RcRequest {
        RcRequest {
            command: CORE_COMMAND.to_owned(),
            parameters: json!({
                "command": "serve",
                "arg": self.serve_args(),
                "_async": true,
            }),
        }
    }
}

impl Lifecycle for ServeHandler {
    fn start(&self, rc: &dyn RemoteControl) -> Result<JobOutcome, UnitError> {
        tracing::info!(unit = %self.unit, protocol = %self.protocol, addr = %self.addr, "starting service");
        let response = self.build_serve_command().send(rc)?;
        let outcome = JobOutcome::from_response(&response);
        match &outcome {
            JobOutcome::Success { jobid } => {
                tracing::info!(unit = %self.unit, %jobid, "service job started")
            }
            JobOutcome::Failure { message } => {
                tracing::warn!(unit = %self.unit, "rclone responded with an error: {message}")
            }
            JobOutcome::Ambiguous { response } => {
                tracing::warn!(unit = %self.unit, %response, "rclone response has neither error nor jobid")
            }
        }
        Ok(outcome)
    }

    // A serve job can only be stopped by id, and ids are not persisted.
    fn stop(&self, _rc: &dyn RemoteControl) -> Result<JobOutcome, UnitError> {
        tracing::warn!(unit = %self.unit, "stopping a service unit is not implemented");
        Ok(JobOutcome::not_implemented())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn unit_config(pairs: &[(&str, &str)]) -> UnitConfig {
        UnitConfig {
            name: UnitName::from("webdav1"),
            section: "unit:webdav1".to_owned(),
            values: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn full() -> UnitConfig {
        unit_config(&[
            ("kind", "service"),
            ("protocol", "webdav"),
            ("user", "a"),
            ("pass", "b"),
            ("addr", "0.0.0.0:8080"),
            ("remote_path", "remote:path"),
        ])
    }

    #[test]
    fn serve_command_shape() {
        let handler = ServeHandler::from_config(&full(), "webdav").expect("handler");
        let request = handler.build_serve_command();
        assert_eq!(request.command, "core/command");
        assert_eq!(
            request.parameters,
            json!({
                "command": "serve",
                "arg": ["webdav", "--user=a", "--pass=b", "--addr=0.0.0.0:8080", "remote:path"],
                "_async": true,
            })
        );
    }

    #[test]
    fn unknown_protocol_is_rejected() {
        let err = ServeHandler::from_config(&full(), "ftp").unwrap_err();
        assert!(
            matches!(err, UnitError::UnsupportedProtocol { ref protocol, .. } if protocol == "ftp"),
            "got: {err}"
        );
    }

    #[test]
    fn missing_key_names_the_section() {
        let cfg = unit_config(&[("user", "a"), ("pass", "b"), ("addr", "x")]);
        let err = ServeHandler::from_config(&cfg, "webdav").unwrap_err();
        assert!(err.to_string().contains("[unit:webdav1] remote_path"), "got: {err}");
    }
}
