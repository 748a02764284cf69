//! bcasync CLI - KlikBCA statements into YNAB or Firefly III

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use bcasync_core::services::init_logging;
use bcasync_core::Error;
use clap::{ArgAction, Args, Parser, Subcommand};
use colored::Colorize;

mod commands;
mod output;

use commands::{credentials, export, sync};

/// bcasync - synchronize your BCA transactions with YNAB or Firefly III
#[derive(Parser)]
#[command(name = "bcasync", version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// KlikBCA username
    #[arg(short = 'u', long, env = "BCA_USERNAME", hide_env_values = true, global = true)]
    pub username: Option<String>,

    /// KlikBCA password
    #[arg(short = 'p', long, env = "BCA_PASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,

    /// YNAB personal access token
    #[arg(short = 't', long, env = "YNAB_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Firefly III personal access token
    #[arg(long, env = "FIREFLY_TOKEN", hide_env_values = true, global = true)]
    pub firefly_token: Option<String>,

    /// Ledger account to import into
    #[arg(short = 'a', long, default_value = "BCA", global = true)]
    pub account: String,

    /// YNAB budget ID
    #[arg(short = 'b', long, default_value = "last-used", global = true)]
    pub budget: String,

    /// Statement lookback in days
    #[arg(long, default_value_t = 27, global = true)]
    pub days: i64,

    /// Ignore stored credentials and ask again
    #[arg(short = 'r', long, global = true)]
    pub reset: bool,

    /// Don't save prompted credentials
    #[arg(long, global = true)]
    pub no_store: bool,

    /// Never prompt; fail when a credential is missing
    #[arg(long, global = true)]
    pub non_interactive: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Import the statement into YNAB (or Firefly III) and reconcile the balance
    Sync {
        /// Firefly III instance URL; sync there instead of YNAB
        #[arg(long, env = "FIREFLY_URL")]
        firefly_url: Option<String>,
        /// Skip the balance adjustment after import
        #[arg(long)]
        no_adjust: bool,
        /// Print the mapped transactions without posting them
        #[arg(long)]
        dry_run: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the statement as CSV
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Manage stored credentials
    Credentials {
        #[command(subcommand)]
        command: credentials::CredentialsCommands,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.global.verbose) {
        eprintln!("{} {:#}", "Warning:".yellow(), e);
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red(), e);
            match e.downcast_ref::<Error>() {
                Some(Error::MissingCredential(_)) => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Sync {
            firefly_url,
            no_adjust,
            dry_run,
            json,
        } => sync::run(&cli.global, firefly_url, no_adjust, dry_run, json),
        Commands::Export { output } => export::run(&cli.global, output),
        Commands::Credentials { command } => credentials::run(command, &cli.global),
    }
}
