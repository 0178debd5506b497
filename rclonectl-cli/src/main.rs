//! rclonectl — command-line control for an rclone remote-control daemon.
//!
//! # Usage
//!
//! ```text
//! rclonectl [--config <path>] [-v] rcd start|stop|status [--json]
//! rclonectl [--config <path>] [-v] unit start|stop <name>
//! rclonectl [--config <path>] [-v] unit list [--json]
//! ```
//!
//! `service` is accepted as an alias of `unit`.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{rcd::RcdCommand, unit::UnitCommand};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "rclonectl",
    version,
    about = "Commandline control tool for rclone",
    long_about = None,
)]
struct Cli {
    /// Configuration file (default: ./rclone-ctl.ini, then the user config directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run, stop, or inspect the rclone remote control daemon.
    Rcd {
        #[command(subcommand)]
        command: RcdCommand,
    },

    /// Manage units (services) provided by the daemon.
    #[command(alias = "service")]
    Unit {
        #[command(subcommand)]
        command: UnitCommand,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = commands::load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Rcd { command } => commands::rcd::run(command, &config),
        Commands::Unit { command } => commands::unit::run(command, &config),
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
