//! Forkwarden CLI - keeps the forks of a GitHub account in check.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::disallowed_macros)]
#![allow(clippy::uninlined_format_args)]

mod ui;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::{debug, error};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use forkwarden::{
    Config, FileLedgerStore, ForkwardenError, GitHubClient, LedgerStore, Reconciler, Workflow,
};

#[derive(Parser)]
#[command(name = "forkwarden")]
#[command(about = "Keep every fork on a GitHub account in check", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a TOML config file (defaults to ./forkwarden.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// GitHub personal access token
    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Directory holding the ledger files
    #[arg(long, global = true)]
    storage_dir: Option<PathBuf>,

    /// Pause between forks that hit the API, in milliseconds
    #[arg(long, global = true)]
    delay_ms: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log output format
    #[arg(long, global = true, default_value = "text")]
    log_format: LogFormat,
}

#[derive(Clone, Copy, Default, clap::ValueEnum)]
enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Disable GitHub Actions on every fork not yet processed
    DisableActions,

    /// Merge upstream changes into every fork
    Sync,

    /// Show the stored ledger of a workflow
    Ledger {
        /// Workflow whose ledger to show
        #[arg(value_enum)]
        workflow: Workflow,

        /// Show the full history of one fork (id or repository name)
        #[arg(long)]
        fork: Option<String>,
    },
}

fn init_tracing(verbose: bool, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref())?;

    if let Some(token) = cli.token.clone().filter(|t| !t.trim().is_empty()) {
        config.token = Some(token);
    }
    if let Some(dir) = &cli.storage_dir {
        config.storage_dir.clone_from(dir);
    }
    if let Some(delay) = cli.delay_ms {
        config.request_delay_ms = delay;
    }

    debug!(?config, "Resolved configuration");
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_format);

    let config = resolve_config(&cli)?;

    match cli.command {
        Commands::DisableActions => run_workflow(&config, Workflow::DisableActions).await,
        Commands::Sync => run_workflow(&config, Workflow::SyncUpstream).await,
        Commands::Ledger { workflow, fork } => show_ledger(&config, workflow, fork.as_deref()).await,
    }
}

async fn run_workflow(config: &Config, workflow: Workflow) -> Result<()> {
    config.validate()?;
    let token = config.token.as_deref().unwrap_or_default();

    let forge = GitHubClient::with_base_url(token, &config.api_url)
        .context("Failed to create GitHub client")?
        .per_page(config.per_page);
    let store = FileLedgerStore::new(config.ledger_path(workflow));

    let reconciler = Reconciler::new(Arc::new(forge), Arc::new(store), workflow.action())
        .with_observer(Arc::new(ui::ConsoleObserver))
        .with_request_delay(config.request_delay());

    match reconciler.run().await {
        Ok(report) => {
            ui::print_summary(workflow, &report.summary);
            Ok(())
        }
        Err(e) => {
            error!(error = %e, %workflow, "Run aborted");
            if e.history_may_be_incomplete() {
                eprintln!(
                    "{} {}",
                    "⚠".yellow(),
                    "Remote changes made during this run may be missing from the ledger.".yellow()
                );
            }
            Err(e.into())
        }
    }
}

async fn show_ledger(config: &Config, workflow: Workflow, fork: Option<&str>) -> Result<()> {
    let store = FileLedgerStore::new(config.ledger_path(workflow));
    let ledger = store.load().await?;

    match fork {
        Some(id_or_name) => {
            let (id, entry) = ledger.find(id_or_name).ok_or_else(|| ForkwardenError::Config {
                reason: format!("No fork '{id_or_name}' in {}", store.location()),
            })?;
            ui::print_entry(id, entry);
        }
        None if ledger.is_empty() => {
            println!("{}", format!("Ledger {} is empty.", store.location()).dimmed());
        }
        None => println!("{}", ui::ledger_table(&ledger)),
    }

    Ok(())
}
