//! The remote operations a run can apply to each fork.
//!
//! Both workflows share [`ForkAction`]; they differ in the remote call, how
//! its result is classified and whether a fork is ever acted on twice.

mod disable;
mod sync;

use async_trait::async_trait;

use crate::entities::{ProcessStatus, Repository, RepositoryDetail};
use crate::forge::{FailureKind, Forge, ForgeError};

pub use disable::DisableActions;
pub use sync::SyncUpstream;

/// When a fork that already has a ledger entry is acted on again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessPolicy {
    /// Act until the action has succeeded once, then never again.
    OnceEver,
    /// Act on every run.
    EveryRun,
}

/// Why an action failed, with the remote's message kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl From<ForgeError> for ActionFailure {
    fn from(err: ForgeError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Classified result of one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The remote changed something.
    Success(String),
    /// The remote reported there was nothing to do.
    NoOp(String),
    Failure(ActionFailure),
}

impl ActionOutcome {
    /// Status recorded in the ledger; a no-op counts as success.
    pub fn status(&self) -> ProcessStatus {
        match self {
            Self::Success(_) | Self::NoOp(_) => ProcessStatus::Success,
            Self::Failure(_) => ProcessStatus::Failed,
        }
    }
}

/// One idempotent remote operation applied to a fork.
///
/// Implementations never retry; a failed fork is reconsidered on the next run.
#[async_trait]
pub trait ForkAction: Send + Sync {
    fn workflow(&self) -> Workflow;

    fn policy(&self) -> ProcessPolicy;

    /// Whether the upstream must be resolved before the action can run.
    fn requires_parent(&self) -> bool;

    /// Run the action. `detail` is the freshly fetched repository detail
    /// when [`requires_parent`](Self::requires_parent) is true.
    async fn execute(
        &self,
        forge: &dyn Forge,
        repo: &Repository,
        detail: Option<&RepositoryDetail>,
    ) -> ActionOutcome;
}

/// The workflows a run can be started with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Workflow {
    /// Turn off GitHub Actions on each fork, once
    #[value(name = "disable")]
    DisableActions,
    /// Merge upstream changes into each fork, every run
    #[value(name = "sync")]
    SyncUpstream,
}

impl Workflow {
    /// Build the action for this workflow.
    pub fn action(self) -> Box<dyn ForkAction> {
        match self {
            Self::DisableActions => Box::new(DisableActions),
            Self::SyncUpstream => Box::new(SyncUpstream),
        }
    }
}

impl std::fmt::Display for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DisableActions => write!(f, "disable-actions"),
            Self::SyncUpstream => write!(f, "sync-upstream"),
        }
    }
}
