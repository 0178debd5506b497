//! `rclonectl rcd` — daemon lifecycle.

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use colored::Colorize;
use serde::Serialize;

use rclonectl_core::Config;
use rclonectl_daemon::{supervisor, DaemonStatus, RemoteControl, StopError, Stopped};

use super::{daemon_config, rc_client};

#[derive(Subcommand, Debug)]
pub enum RcdCommand {
    /// Launch the daemon and record its PID.
    Start,
    /// Send SIGTERM to the recorded daemon.
    Stop,
    /// Report the PID file, process, and RC endpoint state.
    Status {
        /// Emit machine-readable JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Serialize)]
struct StatusReport {
    state: &'static str,
    pid: Option<u32>,
    process_alive: bool,
    rc_url: String,
    rc_alive: bool,
}

pub fn run(command: RcdCommand, config: &Config) -> Result<()> {
    let daemon = daemon_config(config)?;

    match command {
        RcdCommand::Start => {
            match supervisor::status(&daemon.pid_file) {
                Ok(DaemonStatus {
                    pid: Some(pid),
                    process_alive: true,
                }) => bail!(
                    "daemon already running with pid {pid} ({}); stop it first",
                    daemon.pid_file.display()
                ),
                Ok(_) => {}
                Err(err @ StopError::MalformedPid { .. }) => {
                    tracing::warn!("{err}; it will be overwritten");
                }
                Err(err) => return Err(err).context("failed to inspect existing PID file"),
            }

            let started = supervisor::start(&daemon).context("rclone failed to start")?;
            println!("rclone daemon started (pid {})", started.pid);
        }
        RcdCommand::Stop => match supervisor::stop(&daemon.pid_file)
            .context("failed to stop rclone daemon")?
        {
            Stopped::Signalled { pid } => println!("sent SIGTERM to rclone daemon (pid {pid})"),
            Stopped::AlreadyGone { pid } => {
                println!("rclone daemon (pid {pid}) was not running")
            }
        },
        RcdCommand::Status { json } => {
            let process = supervisor::status(&daemon.pid_file)
                .context("failed to read PID file")?;
            let client = rc_client(&daemon);
            let rc_alive = client.check_alive();

            let state = match (process.pid, process.process_alive, rc_alive) {
                (_, _, true) => "running",
                (Some(_), true, false) => "unresponsive",
                (Some(_), false, false) => "stale pid file",
                (None, _, false) => "not running",
            };
            let report = StatusReport {
                state,
                pid: process.pid,
                process_alive: process.process_alive,
                rc_url: client.base_url().to_owned(),
                rc_alive,
            };

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&report)
                        .context("failed to render daemon status JSON")?
                );
            } else {
                print_status(&report);
            }
        }
    }

    Ok(())
}

fn print_status(report: &StatusReport) {
    let state = match report.state {
        "running" => report.state.green().bold(),
        "not running" => report.state.normal(),
        _ => report.state.yellow().bold(),
    };
    let pid = report
        .pid
        .map(|p| p.to_string())
        .unwrap_or_else(|| "-".to_owned());
    println!("{state}  pid {pid}  rc {}", report.rc_url);
}
