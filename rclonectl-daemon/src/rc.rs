//! JSON-over-HTTP client for the daemon's remote-control endpoint.
//!
//! Every call is a `POST <base_url><command>` with a JSON body and HTTP Basic
//! credentials. The client holds no state beyond the endpoint and performs
//! no retries: each call is attempted exactly once.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{json, Value};

use rclonectl_core::types::DEFAULT_RC_TIMEOUT;
use rclonectl_core::RemoteEndpoint;

use crate::error::RcError;

/// Authenticated no-op that echoes its input.
pub const LIVENESS_COMMAND: &str = "rc/noopauth";

const PROBE_FIELD: &str = "rclone";
const PROBE_VALUE: &str = "magic";

/// A channel to the daemon's RC listener.
pub trait RemoteControl {
    /// Where requests go; used in diagnostics.
    fn base_url(&self) -> &str;

    /// Send `parameters` to `command` and return the decoded JSON response.
    fn send(&self, command: &str, parameters: &Value) -> Result<Value, RcError>;

    /// `true` iff the daemon echoes the probe payload back unchanged.
    ///
    /// Transport failures are logged and reported as `false`; this is a
    /// probe, not a hard dependency check.
    fn check_alive(&self) -> bool {
        let probe = json!({ PROBE_FIELD: PROBE_VALUE });
        match self.send(LIVENESS_COMMAND, &probe) {
            Ok(response) => {
                let alive = response.get(PROBE_FIELD).and_then(Value::as_str) == Some(PROBE_VALUE);
                if !alive {
                    tracing::warn!(%response, "RC endpoint answered the liveness probe with an unexpected payload");
                }
                alive
            }
            Err(err) => {
                tracing::error!("RC liveness probe failed: {err}");
                false
            }
        }
    }
}

/// Blocking RC client backed by a `ureq::Agent`.
#[derive(Debug, Clone)]
pub struct RcClient {
    endpoint: RemoteEndpoint,
    agent: ureq::Agent,
    authorization: String,
}

impl RcClient {
    /// No network I/O happens here.
    pub fn new(endpoint: RemoteEndpoint) -> Self {
        Self::with_timeout(endpoint, DEFAULT_RC_TIMEOUT)
    }

    pub fn with_timeout(endpoint: RemoteEndpoint, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_read(timeout)
            .timeout_write(timeout)
            .build();
        let credentials = STANDARD.encode(format!("{}:{}", endpoint.user, endpoint.pass));
        Self {
            endpoint,
            agent,
            authorization: format!("Basic {credentials}"),
        }
    }

    pub fn endpoint(&self) -> &RemoteEndpoint {
        &self.endpoint
    }
}

impl RemoteControl for RcClient {
    fn base_url(&self) -> &str {
        &self.endpoint.base_url
    }

    fn send(&self, command: &str, parameters: &Value) -> Result<Value, RcError> {
        let url = self.endpoint.url_for(command);
        let body = serde_json::to_string(parameters).map_err(RcError::Encode)?;
        tracing::debug!(%url, "RC request");

        let result = self
            .agent
            .post(&url)
            .set("Authorization", &self.authorization)
            .set("Content-Type", "application/json")
            .send_string(&body);

        match result {
            Ok(response) => {
                let text = read_body(&url, response)?;
                tracing::debug!(%url, response = %text, "RC response");
                serde_json::from_str(&text).map_err(|source| RcError::Decode { url, source })
            }
            // The daemon reports command failures as non-2xx with a JSON
            // body; hand those back as data for the caller to classify.
            Err(ureq::Error::Status(code, response)) => {
                let text = read_body(&url, response)?;
                match serde_json::from_str::<Value>(&text) {
                    Ok(value) if value.is_object() => {
                        tracing::debug!(%url, code, response = %text, "RC error response");
                        Ok(value)
                    }
                    _ => Err(RcError::Status { url, code }),
                }
            }
            Err(ureq::Error::Transport(transport)) => Err(RcError::Transport {
                url,
                source: Box::new(transport),
            }),
        }
    }
}

fn read_body(url: &str, response: ureq::Response) -> Result<String, RcError> {
    response.into_string().map_err(|source| RcError::Read {
        url: url.to_owned(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    /// Replays a fixed answer and records what was sent.
    struct Scripted {
        answer: RefCell<Option<Result<Value, RcError>>>,
        sent: RefCell<Vec<(String, Value)>>,
    }

    impl Scripted {
        fn new(answer: Result<Value, RcError>) -> Self {
            Self {
                answer: RefCell::new(Some(answer)),
                sent: RefCell::new(Vec::new()),
            }
        }
    }

    impl RemoteControl for Scripted {
        fn base_url(&self) -> &str {
            "http://scripted/"
        }

        fn send(&self, command: &str, parameters: &Value) -> Result<Value, RcError> {
            self.sent
                .borrow_mut()
                .push((command.to_owned(), parameters.clone()));
            self.answer.borrow_mut().take().expect("single call")
        }
    }

    #[test]
    fn check_alive_sends_the_probe_payload() {
        let rc = Scripted::new(Ok(json!({"rclone": "magic"})));
        assert!(rc.check_alive());
        let sent = rc.sent.borrow();
        assert_eq!(sent[0].0, "rc/noopauth");
        assert_eq!(sent[0].1, json!({"rclone": "magic"}));
    }

    #[test]
    fn check_alive_rejects_a_different_echo() {
        assert!(!Scripted::new(Ok(json!({"rclone": "other"}))).check_alive());
        assert!(!Scripted::new(Ok(json!({}))).check_alive());
    }

    #[test]
    fn check_alive_swallows_transport_errors() {
        let err = RcError::Status {
            url: "http://x/rc/noopauth".to_owned(),
            code: 502,
        };
        assert!(!Scripted::new(Err(err)).check_alive());
    }

    #[test]
    fn authorization_header_is_basic_base64() {
        let client = RcClient::new(RemoteEndpoint::from_addr("localhost:5572", "u", "p"));
        assert_eq!(client.authorization, "Basic dTpw");
        assert_eq!(client.endpoint().base_url, "http://localhost:5572/");
    }
}
