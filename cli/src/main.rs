//! PortAssert CLI - Assert which ports are open or closed
//!
//! Reads a host/port inventory, scans every declared host once per
//! protocol, and reports one assertion per expected port as TAP.

mod commands;
mod logging;
mod tap;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "portassert")]
#[command(author, version, about = "Assert which ports on which hosts are open or closed")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Settings file (default: ~/.portassert/settings.json)
    #[arg(long, global = true, value_name = "PATH")]
    settings: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan every host in the inventory and check its ports
    #[command(alias = "test")]
    Run {
        /// Inventory file (YAML or JSON)
        inventory: PathBuf,

        #[command(flatten)]
        overrides: commands::Overrides,
    },

    /// Show the test units an inventory produces, without scanning
    Plan {
        /// Inventory file (YAML or JSON)
        inventory: PathBuf,

        #[command(flatten)]
        overrides: commands::Overrides,
    },

    /// Show effective settings
    Config,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    logging::init(cli.verbose);

    match dispatch(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(error_status(&err))
        }
    }
}

async fn dispatch(cli: Cli) -> anyhow::Result<ExitCode> {
    let settings = commands::load_settings(cli.settings.as_deref()).await?;
    tracing::debug!(?settings, "loaded settings");

    match cli.command {
        Commands::Run {
            inventory,
            overrides,
        } => commands::run::run(&inventory, overrides.apply(settings), cli.json).await,
        Commands::Plan {
            inventory,
            overrides,
        } => {
            commands::plan::run(&inventory, overrides.apply(settings), cli.json).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config => {
            commands::config::show(&settings, cli.json)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Exit status for an aborted command: 2 for a bad inventory or bad
/// settings, 1 for anything else.
fn error_status(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<portassert_core::Error>() {
        Some(e) if e.is_configuration() => 2,
        _ => 1,
    }
}
