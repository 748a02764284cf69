//! Credentials command - inspect or delete the stored credentials file

use anyhow::Result;
use bcasync_core::config::CredentialStore;
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Confirm;

use crate::GlobalArgs;

#[derive(Subcommand)]
pub enum CredentialsCommands {
    /// Delete the stored credentials
    Delete {
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
    /// Print where credentials are stored
    Path,
}

pub fn run(command: CredentialsCommands, global: &GlobalArgs) -> Result<()> {
    let store = CredentialStore::default_location()?;

    match command {
        CredentialsCommands::Path => {
            println!("{}", store.path().display());
        }
        CredentialsCommands::Delete { force } => {
            if !store.exists() {
                println!("{}", "No stored credentials".dimmed());
                return Ok(());
            }

            if !force && !global.non_interactive {
                println!(
                    "\n{}",
                    format!("This will delete {}", store.path().display()).yellow()
                );
                if !Confirm::new()
                    .with_prompt("Are you sure?")
                    .default(false)
                    .interact()?
                {
                    println!("{}\n", "Cancelled".dimmed());
                    return Ok(());
                }
            }

            if store.delete()? {
                println!("{} Credentials deleted", "✓".green());
            }
        }
    }
    Ok(())
}
