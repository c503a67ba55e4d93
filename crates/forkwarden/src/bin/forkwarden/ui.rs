//! Terminal output for the forkwarden CLI.
//!
//! This module uses println! for CLI output, which is appropriate
//! for terminal user interfaces.

#![allow(clippy::disallowed_macros)]

use colored::Colorize;
use comfy_table::{Cell, Color, ContentArrangement, Table};

use forkwarden::{
    Ledger, LedgerEntry, ProcessStatus, RunEvent, RunObserver, RunSummary, Workflow,
};

/// Get colored status string
pub fn status_colored(status: ProcessStatus) -> String {
    match status {
        ProcessStatus::Success => "success".green().to_string(),
        ProcessStatus::Failed => "failed".red().to_string(),
        ProcessStatus::Skipped => "skipped".yellow().to_string(),
    }
}

fn status_color(status: ProcessStatus) -> Color {
    match status {
        ProcessStatus::Success => Color::Green,
        ProcessStatus::Failed => Color::Red,
        ProcessStatus::Skipped => Color::Yellow,
    }
}

/// Prints run progress as it happens.
pub struct ConsoleObserver;

impl RunObserver for ConsoleObserver {
    fn on_event(&self, event: &RunEvent) {
        match event {
            RunEvent::Started {
                workflow,
                owner,
                forks,
                archived,
                ..
            } => {
                println!("Finding forks for user: {}", owner.bold());
                println!(
                    "Found {forks} forked repositories ({archived} archived), running {}.",
                    workflow.to_string().cyan()
                );
            }
            RunEvent::AlreadyProcessed { repo, .. } => {
                println!("⏭️  Already processed: {}", repo.dimmed());
            }
            RunEvent::Archived { repo, .. } => {
                println!("📦 Skipping archived repository: {repo}");
            }
            RunEvent::ParentUnresolved { repo, error, .. } => {
                eprintln!(
                    "{}",
                    format!("Could not fetch parent repo info for {repo}: {error}").dimmed()
                );
            }
            RunEvent::NoParent { repo, .. } => {
                println!("⚠️  No parent repository found for {repo}");
            }
            RunEvent::Succeeded {
                repo,
                original_repository,
                message,
                ..
            } => {
                println!(
                    "✅ {repo} ({}): {message}",
                    original_repository.dimmed()
                );
            }
            RunEvent::UpToDate { repo, message, .. } => {
                println!("ℹ️  No changes needed for {repo} ({message})");
            }
            RunEvent::Failed { repo, error, .. } => {
                eprintln!("❌ {} {repo}: {error}", "Failed".red());
            }
            RunEvent::Finished { .. } => {}
        }
    }
}

/// Print the end-of-run summary
pub fn print_summary(workflow: Workflow, summary: &RunSummary) {
    println!();
    println!("{}", format!("{workflow} completed!").bold());
    println!("======================");
    println!(
        "✅ Succeeded: {} forks ({} already up to date)",
        summary.succeeded, summary.up_to_date
    );
    println!("❌ Failed: {} forks", summary.failed);
    println!("⏭️  Skipped: {} forks", summary.skipped);
    println!("📦 Archived: {} forks", summary.archived);
}

/// Create a table with one row per ledger entry
pub fn ledger_table(ledger: &Ledger) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("ID").fg(Color::Cyan),
        Cell::new("Name").fg(Color::Cyan),
        Cell::new("Upstream").fg(Color::Cyan),
        Cell::new("Status").fg(Color::Cyan),
        Cell::new("Last processed").fg(Color::Cyan),
        Cell::new("Runs").fg(Color::Cyan),
        Cell::new("Last error").fg(Color::Cyan),
    ]);

    for (id, entry) in ledger.iter() {
        let upstream = if entry.has_known_origin() {
            Cell::new(&entry.original_repository)
        } else {
            Cell::new(&entry.original_repository).fg(Color::DarkGrey)
        };
        table.add_row(vec![
            Cell::new(id),
            Cell::new(&entry.name),
            upstream,
            Cell::new(entry.last_status).fg(status_color(entry.last_status)),
            Cell::new(entry.last_processed_at.format("%Y-%m-%d %H:%M:%S UTC")),
            Cell::new(entry.history.len()),
            Cell::new(entry.last_error.as_deref().unwrap_or("-")),
        ]);
    }

    table
}

/// Print one entry with its full history
pub fn print_entry(id: &str, entry: &LedgerEntry) {
    println!("{} {}", entry.name.bold(), format!("(#{id})").dimmed());
    println!("  Upstream:       {}", entry.original_repository);
    println!("  Status:         {}", status_colored(entry.last_status));
    println!("  Last processed: {}", entry.last_processed_at.to_rfc3339());
    if let Some(error) = &entry.last_error {
        println!("  Last error:     {}", error.red());
    }

    if entry.history.is_empty() {
        println!("  {}", "No history recorded.".dimmed());
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("#").fg(Color::Cyan),
        Cell::new("When").fg(Color::Cyan),
        Cell::new("Status").fg(Color::Cyan),
        Cell::new("Detail").fg(Color::Cyan),
    ]);
    for (index, record) in entry.history.iter().enumerate() {
        let detail = record
            .error
            .as_deref()
            .or(record.message.as_deref())
            .unwrap_or("-");
        table.add_row(vec![
            Cell::new(index + 1),
            Cell::new(record.timestamp.format("%Y-%m-%d %H:%M:%S UTC")),
            Cell::new(record.status).fg(status_color(record.status)),
            Cell::new(detail),
        ]);
    }
    println!("{table}");
}
