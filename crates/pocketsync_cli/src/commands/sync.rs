//! Sync command implementation.

use super::Format;
use pocketsync_engine::{SyncEngine, SyncReport};
use pocketsync_model::MonthFilter;
use serde::Serialize;

/// One entity's result, as printed.
#[derive(Debug, Serialize)]
pub struct ReportOutput {
    /// Entity kind.
    pub kind: &'static str,
    /// Final status.
    pub status: String,
    /// Confirmed deletions.
    pub deleted: usize,
    /// Confirmed creations.
    pub created: usize,
    /// Confirmed edits.
    pub updated: usize,
    /// Rows written from the server.
    pub pulled: usize,
    /// Server rows skipped in favour of local changes.
    pub kept_local: usize,
    /// Pushes that will be retried next time.
    pub push_failures: Vec<String>,
}

impl From<&SyncReport> for ReportOutput {
    fn from(report: &SyncReport) -> Self {
        Self {
            kind: report.kind,
            status: report.status.to_string(),
            deleted: report.deleted,
            created: report.created,
            updated: report.updated,
            pulled: report.pulled,
            kept_local: report.kept_local,
            push_failures: report.push_failures.clone(),
        }
    }
}

/// Runs the sync command. Fails if any entity's pass failed.
pub async fn run(
    engine: &SyncEngine,
    month: Option<MonthFilter>,
    format: Format,
) -> Result<(), Box<dyn std::error::Error>> {
    let reports = engine.sync(month).await;
    let output: Vec<ReportOutput> = reports.iter().map(ReportOutput::from).collect();

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&output)?),
        Format::Text => print_text_output(&output),
    }

    match reports.iter().find(|report| !report.is_success()) {
        Some(failed) => Err(format!("{} {}", failed.kind, failed.status).into()),
        None => Ok(()),
    }
}

fn print_text_output(output: &[ReportOutput]) {
    for report in output {
        println!("{}: {}", report.kind, report.status);
        println!(
            "  pushed: {} created, {} updated, {} deleted",
            report.created, report.updated, report.deleted
        );
        println!(
            "  pulled: {} written, {} kept local",
            report.pulled, report.kept_local
        );
        for failure in &report.push_failures {
            println!("  retry later: {failure}");
        }
    }
}
