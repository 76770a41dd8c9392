use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;
mod ledger_file;
mod reconcile_cmd;
mod state;

use reconcile_cmd::ReconcileArgs;

#[derive(Parser, Debug)]
#[command(
    name = "paytally",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("PAYTALLY_BUILD_SHA"), ")"),
    about = "Reconcile exported earnings against a spreadsheet ledger"
)]
struct Cli {
    /// Log at debug level (RUST_LOG still wins when set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Match exported payments against the ledger and write the differences
    Reconcile {
        /// Saved payments page(s), in page order
        #[arg(long, num_args = 1.., required = true)]
        html: Vec<PathBuf>,

        /// Plan mutations without writing them
        #[arg(long)]
        dry_run: bool,

        /// Run even when today is not payday
        #[arg(long)]
        force: bool,

        /// Skip archiving the combined export
        #[arg(long)]
        no_backup: bool,

        /// Reconcile against an exported ledger file instead of the web app
        #[arg(long, value_name = "LEDGER_JSON")]
        ledger_file: Option<PathBuf>,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the configured payout weekday and whether today is payday
    Payday,

    /// Manage ~/.paytally/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config if none exists
    Init,
    /// Print the effective config
    Show,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default.to_string());
    tracing_subscriber::registry()
        .with(EnvFilter::new(filter))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Reconcile {
            html,
            dry_run,
            force,
            no_backup,
            ledger_file,
            json,
        } => {
            let cfg = config::load_config()?;
            let args = ReconcileArgs {
                html,
                dry_run,
                force,
                no_backup,
                ledger_file,
                json,
            };
            reconcile_cmd::run_reconcile(&cfg, args).await?;
        }

        Command::Payday => {
            let cfg = config::load_config()?;
            reconcile_cmd::run_payday(&cfg).await?;
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                let cfg = config::load_config()?;
                print!("{}", toml::to_string_pretty(&cfg)?);
            }
        },
    }

    Ok(())
}
