//! Sync command - import the statement into a ledger and reconcile

use anyhow::{bail, Result};
use bcasync_core::adapters::firefly::FireflyClient;
use bcasync_core::adapters::ynab::YnabClient;
use bcasync_core::config::{Config, CredentialField, Sink};
use bcasync_core::services::LogEvent;
use bcasync_core::{ReconcileStatus, SyncOutcome, SyncReport, SyncService, SyncTarget};
use colored::Colorize;

use super::{bank_client, build_config, client_ip, log_event};
use crate::output;
use crate::GlobalArgs;

pub fn run(
    global: &GlobalArgs,
    firefly_url: Option<String>,
    no_adjust: bool,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let sink = match firefly_url {
        Some(url) => Sink::Firefly { url },
        None => Sink::Ynab,
    };
    let config = build_config(global, sink, !no_adjust)?;

    log_event(
        LogEvent::new("sync_started")
            .with_command("sync")
            .with_sink(config.sink.name()),
    );

    let report = match execute(&config, dry_run) {
        Ok(report) => report,
        Err(e) => {
            log_event(
                LogEvent::new("sync_failed")
                    .with_command("sync")
                    .with_sink(config.sink.name())
                    .with_failure(&e),
            );
            return Err(e);
        }
    };

    log_event(
        LogEvent::new("sync_completed")
            .with_command("sync")
            .with_sink(config.sink.name()),
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, &config);
    }

    // The import stands; only the exit status reports the failed adjustment
    if let SyncOutcome::Submitted {
        reconciliation: ReconcileStatus::Failed { error },
        ..
    } = &report.outcome
    {
        bail!("balance reconciliation failed: {}", error);
    }
    Ok(())
}

fn execute(config: &Config, dry_run: bool) -> Result<SyncReport> {
    let bank = bank_client(config)?;
    let ip = client_ip()?.to_string();
    let service = SyncService::new(&bank, config, config.now()?);

    match &config.sink {
        Sink::Ynab => {
            let token = config.credentials.require(CredentialField::YnabToken)?;
            let ynab = match &config.ynab_url {
                Some(url) => YnabClient::new_with_base_url(token, url)?,
                None => YnabClient::new(token)?,
            };
            service.sync(SyncTarget::Budget(&ynab), &ip, dry_run)
        }
        Sink::Firefly { url } => {
            let token = config.credentials.require(CredentialField::FireflyToken)?;
            let firefly = FireflyClient::new(url, token)?;
            service.sync(SyncTarget::Ledger(&firefly), &ip, dry_run)
        }
        Sink::Csv => bail!("use `bcasync export` for CSV output"),
    }
}

fn print_report(report: &SyncReport, config: &Config) {
    println!(
        "{}",
        format!(
            "Statement {} to {} ({} line(s), {} pending)",
            report.start_date, report.end_date, report.fetched, report.pending
        )
        .dimmed()
    );
    println!();

    match &report.outcome {
        SyncOutcome::EmptyStatement => {
            output::warning(&format!(
                "No transactions found in the last {} days",
                config.days
            ));
        }
        SyncOutcome::DryRun { transactions } => {
            output::warning("DRY RUN - No changes applied");
            println!();
            println!("{}", output::transactions_table(transactions));
        }
        SyncOutcome::LedgerDryRun { splits } => {
            output::warning("DRY RUN - No changes applied");
            println!();
            println!("{}", output::splits_table(splits));
        }
        SyncOutcome::Exported { count } => {
            output::success(&format!("✓ Exported {} transaction(s)", count));
        }
        SyncOutcome::Submitted {
            created,
            duplicates,
            reconciliation,
        } => {
            output::success(&format!(
                "✓ {} transaction(s) created in {} account {:?}",
                created, report.sink, config.account_name
            ));
            if *duplicates > 0 {
                println!("  Skipped: {} (already imported)", duplicates);
            }

            match reconciliation {
                ReconcileStatus::Skipped => {}
                ReconcileStatus::Balanced => println!("  Balance matches the bank"),
                ReconcileStatus::Adjusted { amount } => {
                    output::success(&format!(
                        "✓ Balance adjustment of {} created",
                        output::format_amount(*amount)
                    ));
                }
                ReconcileStatus::Failed { error } => {
                    output::error(&format!("Balance adjustment failed: {}", error));
                }
            }
        }
    }
    println!();
}
