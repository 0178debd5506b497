use std::path::PathBuf;

use thiserror::Error;

/// Failure talking to the daemon's RC endpoint.
#[derive(Debug, Error)]
pub enum RcError {
    #[error("failed to encode RC parameters: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("RC request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<ureq::Transport>,
    },

    /// Non-2xx status whose body is not a JSON object.
    #[error("RC endpoint {url} answered HTTP {code} without a JSON body")]
    Status { url: String, code: u16 },

    #[error("failed to read RC response from {url}: {source}")]
    Read {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("RC response from {url} is not valid JSON: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// The daemon could not be brought up.
#[derive(Debug, Error)]
pub enum StartError {
    #[error("cannot prepare cache directory {path}: {source}")]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot launch {exec}: {source}")]
    Spawn {
        exec: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot poll daemon process {pid}: {source}")]
    Poll {
        pid: u32,
        #[source]
        source: std::io::Error,
    },

    /// The process was gone before the grace period elapsed.
    #[error("daemon exited during the grace period with exit code [{}]", display_code(.exit_code))]
    Exited { exit_code: Option<i32> },

    #[error("cannot write PID file {path}: {source}")]
    PidFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The daemon to stop could not be determined or signalled.
#[derive(Debug, Error)]
pub enum StopError {
    #[error("cannot read PID file {path}: {source}")]
    NoPidFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("PID file {path} does not contain a process id: {content:?}")]
    MalformedPid { path: PathBuf, content: String },

    #[error("cannot signal process {pid}: {source}")]
    Signal {
        pid: u32,
        #[source]
        source: nix::errno::Errno,
    },
}

fn display_code(code: &Option<i32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "killed by signal".to_owned())
}
