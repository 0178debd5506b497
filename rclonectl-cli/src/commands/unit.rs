//! `rclonectl unit` — start, stop, and list units.

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use rclonectl_core::{Config, UnitName};
use rclonectl_units::{bind, list, resolve, JobOutcome, Unit};

use super::{daemon_config, rc_client};

#[derive(Subcommand, Debug)]
pub enum UnitCommand {
    /// Ask the daemon to start a unit.
    Start {
        /// Unit name, without the `unit:` prefix.
        name: String,
    },
    /// Ask the daemon to stop a unit.
    Stop {
        /// Unit name, without the `unit:` prefix.
        name: String,
    },
    /// List declared units.
    List {
        /// Emit machine-readable JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Tabled)]
struct UnitTableRow {
    #[tabled(rename = "unit")]
    name: String,
    #[tabled(rename = "kind")]
    kind: String,
    #[tabled(rename = "protocol")]
    protocol: String,
    #[tabled(rename = "detail")]
    detail: String,
}

pub fn run(command: UnitCommand, config: &Config) -> Result<()> {
    match command {
        UnitCommand::Start { name } => {
            let unit = load_unit(&name, config)?;
            let client = rc_client(&daemon_config(config)?);
            tracing::info!("starting unit {name}");
            let outcome = unit
                .start(&client)
                .with_context(|| format!("failed to start unit '{name}'"))?;
            report(&unit, outcome)
        }
        UnitCommand::Stop { name } => {
            let unit = load_unit(&name, config)?;
            let client = rc_client(&daemon_config(config)?);
            tracing::info!("stopping unit {name}");
            let outcome = unit
                .stop(&client)
                .with_context(|| format!("failed to stop unit '{name}'"))?;
            report(&unit, outcome)
        }
        UnitCommand::List { json } => {
            let rows = list(config);
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&rows).context("failed to render unit list")?
                );
                return Ok(());
            }
            if rows.is_empty() {
                println!("No units declared. Add a [unit:<name>] section to rclone-ctl.ini.");
                return Ok(());
            }
            let table_rows: Vec<UnitTableRow> = rows
                .into_iter()
                .map(|row| UnitTableRow {
                    name: row.name.0,
                    kind: row.kind.unwrap_or_else(|| "?".to_owned()),
                    protocol: row.protocol.unwrap_or_else(|| "-".to_owned()),
                    detail: row.problem.unwrap_or_else(|| row.section),
                })
                .collect();
            let mut table = Table::new(table_rows);
            table.with(Style::rounded());
            println!("{table}");
            Ok(())
        }
    }
}

fn load_unit(name: &str, config: &Config) -> Result<Unit> {
    let unit_name = UnitName::from(name);
    let unit_config =
        resolve(&unit_name, config).with_context(|| format!("cannot resolve unit '{name}'"))?;
    bind(unit_config).with_context(|| format!("cannot bind unit '{name}'"))
}

/// Daemon-side failures are data, but the invocation still ends non-zero.
fn report(unit: &Unit, outcome: JobOutcome) -> Result<()> {
    let (name, kind) = unit.describe();
    match outcome {
        JobOutcome::Success { jobid } => {
            println!("{} {kind} {name}: job {jobid}", "ok".green().bold());
            Ok(())
        }
        JobOutcome::Failure { message } => {
            bail!("{kind} {name}: rclone responded with an error: {message}")
        }
        JobOutcome::Ambiguous { response } => {
            bail!("{kind} {name}: unknown response shape from rclone: {response}")
        }
    }
}
