//! Classification of RC responses into job outcomes.
//!
//! Derived per call, never stored:
//!
//! | response                         | outcome     |
//! |----------------------------------|-------------|
//! | `error` truthy (any `jobid`)     | `Failure`   |
//! | `jobid` present                  | `Success`   |
//! | neither                          | `Ambiguous` |

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier of an asynchronous job created by the daemon.
///
/// The daemon sends a number; strings are accepted too and kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Success { jobid: JobId },
    /// The daemon rejected the command.
    Failure { message: String },
    /// Neither an error nor a job id: the command may or may not have run.
    Ambiguous { response: Value },
}

pub const NOT_IMPLEMENTED: &str = "not implemented";

impl JobOutcome {
    pub fn from_response(response: &Value) -> Self {
        if let Some(error) = response.get("error").filter(|e| is_truthy(e)) {
            return JobOutcome::Failure {
                message: failure_message(error, response),
            };
        }

        let jobid = match response.get("jobid") {
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            _ => None,
        };
        match jobid {
            Some(id) => JobOutcome::Success { jobid: JobId(id) },
            None => JobOutcome::Ambiguous {
                response: response.clone(),
            },
        }
    }

    pub fn not_implemented() -> Self {
        JobOutcome::Failure {
            message: NOT_IMPLEMENTED.to_owned(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Success { .. })
    }
}

impl fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobOutcome::Success { jobid } => write!(f, "started job {jobid}"),
            JobOutcome::Failure { message } => write!(f, "failed: {message}"),
            JobOutcome::Ambiguous { response } => {
                write!(f, "unknown response shape: {response}")
            }
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

// `error: true` comes with the command's output under `result`.
fn failure_message(error: &Value, response: &Value) -> String {
    if let Value::String(message) = error {
        return message.clone();
    }
    match response.get("result") {
        Some(Value::String(result)) if !result.trim().is_empty() => result.trim().to_owned(),
        _ => "daemon reported an error".to_owned(),
    }
}
