//! Lifecycle of the daemon process across short-lived invocations.
//!
//! ```text
//! NotRunning ──start──▶ Starting ──grace period, still alive──▶ Running
//!                           └──────exited during grace period──▶ FailedToStart
//! Running ──stop (SIGTERM)──▶ NotRunning
//! ```
//!
//! Readiness is a fixed grace period followed by a single exit-status poll,
//! not a health-check loop: a daemon that dies after the grace period is
//! reported as started. The PID file is accessed without locking; two
//! concurrent `start` calls race on it.

use std::fs;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::{setsid, Pid};

use rclonectl_core::DaemonConfig;

use crate::error::{StartError, StopError};
use crate::pidfile;

/// A daemon that survived its grace period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Started {
    pub pid: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stopped {
    /// SIGTERM was delivered.
    Signalled { pid: u32 },
    /// No process had that id any more.
    AlreadyGone { pid: u32 },
}

impl Stopped {
    pub fn pid(&self) -> u32 {
        match *self {
            Stopped::Signalled { pid } | Stopped::AlreadyGone { pid } => pid,
        }
    }
}

/// What the PID file and the process table say about the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaemonStatus {
    pub pid: Option<u32>,
    pub process_alive: bool,
}

/// Launch the daemon and persist its PID once it has outlived the grace period.
///
/// Never writes the PID file when the process exits early. Not retried.
pub fn start(cfg: &DaemonConfig) -> Result<Started, StartError> {
    ensure_cache_dir(&cfg.cache_dir)?;

    let args = cfg.launch_args();
    tracing::info!(
        exec = %cfg.exec_file.display(),
        args = ?redact(&args),
        "launching daemon"
    );

    let mut command = Command::new(&cfg.exec_file);
    command.args(&args).stdin(Stdio::null());
    // New session: the daemon must not receive the terminal's SIGHUP.
    // SAFETY: setsid is async-signal-safe and touches no parent state.
    unsafe {
        command.pre_exec(|| setsid().map(drop).map_err(std::io::Error::from));
    }
    let mut child = command
        .spawn()
        .map_err(|source| StartError::Spawn {
            exec: cfg.exec_file.clone(),
            source,
        })?;
    let pid = child.id();

    tracing::debug!(
        pid,
        grace_ms = cfg.grace_period.as_millis() as u64,
        "waiting for daemon to settle"
    );
    thread::sleep(cfg.grace_period);

    match child.try_wait() {
        Ok(Some(status)) => {
            let exit_code = status.code();
            tracing::error!(pid, ?exit_code, "daemon exited during the grace period");
            return Err(StartError::Exited { exit_code });
        }
        Ok(None) => {}
        Err(source) => return Err(StartError::Poll { pid, source }),
    }

    pidfile::write(&cfg.pid_file, pid).map_err(|source| StartError::PidFile {
        path: cfg.pid_file.clone(),
        source,
    })?;
    tracing::info!(pid, pid_file = %cfg.pid_file.display(), "daemon running");
    Ok(Started { pid })
}

/// Send SIGTERM to the process named by the PID file, then remove the file.
///
/// A process that no longer exists counts as stopped.
pub fn stop(pid_file: &Path) -> Result<Stopped, StopError> {
    let pid = pidfile::read(pid_file)?;
    tracing::info!(pid, "sending SIGTERM to daemon");

    let stopped = match kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
        Ok(()) => Stopped::Signalled { pid },
        Err(Errno::ESRCH) => {
            tracing::warn!(pid, "no process found, already stopped?");
            Stopped::AlreadyGone { pid }
        }
        Err(source) => return Err(StopError::Signal { pid, source }),
    };

    if let Err(err) = pidfile::remove(pid_file) {
        tracing::warn!(pid_file = %pid_file.display(), "could not remove PID file: {err}");
    }
    Ok(stopped)
}

/// Read the PID file and probe the process with the null signal.
pub fn status(pid_file: &Path) -> Result<DaemonStatus, StopError> {
    let pid = match pidfile::read(pid_file) {
        Ok(pid) => pid,
        Err(StopError::NoPidFile { source, .. })
            if source.kind() == std::io::ErrorKind::NotFound =>
        {
            return Ok(DaemonStatus {
                pid: None,
                process_alive: false,
            })
        }
        Err(err) => return Err(err),
    };

    Ok(DaemonStatus {
        pid: Some(pid),
        process_alive: is_process_alive(pid),
    })
}

/// `EPERM` means the process exists but belongs to someone else.
pub fn is_process_alive(pid: u32) -> bool {
    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    matches!(kill(Pid::from_raw(raw), None), Ok(()) | Err(Errno::EPERM))
}

fn ensure_cache_dir(dir: &Path) -> Result<(), StartError> {
    if dir.is_dir() {
        return Ok(());
    }
    tracing::debug!(path = %dir.display(), "creating cache directory");
    fs::create_dir_all(dir).map_err(|source| StartError::CacheDir {
        path: dir.to_path_buf(),
        source,
    })
}

fn redact(args: &[String]) -> Vec<String> {
    args.iter()
        .map(|arg| match arg.split_once('=') {
            Some((flag, _)) if flag == "--rc-pass" => format!("{flag}=***"),
            _ => arg.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redact_hides_only_the_password() {
        let args = vec![
            "rcd".to_owned(),
            "--rc-user=u".to_owned(),
            "--rc-pass=secret".to_owned(),
        ];
        assert_eq!(redact(&args), vec!["rcd", "--rc-user=u", "--rc-pass=***"]);
    }

    #[test]
    fn current_process_is_alive() {
        assert!(is_process_alive(std::process::id()));
    }

    #[test]
    fn out_of_range_pid_is_not_alive() {
        assert!(!is_process_alive(u32::MAX));
    }

    #[test]
    fn status_without_pid_file_is_not_running() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let status = status(&dir.path().join("rclone-ctl.pid")).expect("status");
        assert_eq!(
            status,
            DaemonStatus {
                pid: None,
                process_alive: false
            }
        );
    }
}
