//! Structured progress events emitted while a run reconciles forks.

use tracing::{debug, info, warn};

use crate::forge::FailureKind;
use crate::summary::RunSummary;
use crate::workflow::Workflow;

/// Something that happened during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    Started {
        workflow: Workflow,
        owner: String,
        forks: usize,
        archived: usize,
        non_forks: usize,
    },
    /// Skipped because the ledger says the action already succeeded.
    AlreadyProcessed { fork_id: u64, repo: String },
    Archived {
        fork_id: u64,
        repo: String,
        original_repository: String,
    },
    /// Best-effort upstream lookup failed; the action outcome is unaffected.
    ParentUnresolved {
        fork_id: u64,
        repo: String,
        error: String,
    },
    /// The host reports no upstream for the fork.
    NoParent { fork_id: u64, repo: String },
    Succeeded {
        fork_id: u64,
        repo: String,
        original_repository: String,
        message: String,
    },
    /// The action succeeded without changing anything.
    UpToDate {
        fork_id: u64,
        repo: String,
        message: String,
    },
    Failed {
        fork_id: u64,
        repo: String,
        kind: FailureKind,
        error: String,
    },
    Finished { summary: RunSummary },
}

/// Receives run events. Implementations decide how, or whether, to render them.
pub trait RunObserver: Send + Sync {
    fn on_event(&self, event: &RunEvent);
}

/// Logs every event through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl RunObserver for TracingObserver {
    fn on_event(&self, event: &RunEvent) {
        match event {
            RunEvent::Started {
                workflow,
                owner,
                forks,
                archived,
                non_forks,
            } => info!(%workflow, %owner, forks, archived, non_forks, "Starting run"),
            RunEvent::AlreadyProcessed { fork_id, repo } => {
                debug!(fork_id, %repo, "Already processed");
            }
            RunEvent::Archived {
                fork_id,
                repo,
                original_repository,
            } => info!(fork_id, %repo, %original_repository, "Skipping archived repository"),
            RunEvent::ParentUnresolved {
                fork_id,
                repo,
                error,
            } => warn!(fork_id, %repo, %error, "Could not fetch parent repository"),
            RunEvent::NoParent { fork_id, repo } => {
                warn!(fork_id, %repo, "No parent repository found");
            }
            RunEvent::Succeeded {
                fork_id,
                repo,
                original_repository,
                message,
            } => info!(fork_id, %repo, %original_repository, %message, "Action succeeded"),
            RunEvent::UpToDate {
                fork_id,
                repo,
                message,
            } => info!(fork_id, %repo, %message, "Nothing to do"),
            RunEvent::Failed {
                fork_id,
                repo,
                kind,
                error,
            } => warn!(fork_id, %repo, %kind, %error, "Action failed"),
            RunEvent::Finished { summary } => info!(
                succeeded = summary.succeeded,
                up_to_date = summary.up_to_date,
                failed = summary.failed,
                skipped = summary.skipped,
                archived = summary.archived,
                "Run completed"
            ),
        }
    }
}
