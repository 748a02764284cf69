//! Export command - write the statement window as CSV

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use bcasync_core::config::Sink;
use bcasync_core::services::LogEvent;
use bcasync_core::{SyncOutcome, SyncService};
use colored::Colorize;

use super::{bank_client, build_config, client_ip, log_event};
use crate::output;
use crate::GlobalArgs;

pub fn run(global: &GlobalArgs, output_path: Option<PathBuf>) -> Result<()> {
    let config = build_config(global, Sink::Csv, false)?;
    log_event(LogEvent::new("export_started").with_command("export").with_sink("csv"));

    let bank = bank_client(&config)?;
    let ip = client_ip()?.to_string();
    let service = SyncService::new(&bank, &config, config.now()?);

    let result = match &output_path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            service.export(&ip, BufWriter::new(file))
        }
        None => service.export(&ip, std::io::stdout().lock()),
    };

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            log_event(
                LogEvent::new("export_failed")
                    .with_command("export")
                    .with_sink("csv")
                    .with_failure(&e),
            );
            return Err(e);
        }
    };
    log_event(LogEvent::new("export_completed").with_command("export").with_sink("csv"));

    let count = match report.outcome {
        SyncOutcome::Exported { count } => count,
        _ => 0,
    };

    // stdout carries the CSV itself, so the summary goes to stderr there
    match &output_path {
        Some(path) => output::success(&format!(
            "✓ Exported {} transaction(s) to {}",
            count,
            path.display()
        )),
        None => eprintln!(
            "{}",
            format!(
                "Exported {} transaction(s) from {} to {}",
                count, report.start_date, report.end_date
            )
            .dimmed()
        ),
    }
    Ok(())
}
