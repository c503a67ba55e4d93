//! Turn off GitHub Actions on every fork, once.

use async_trait::async_trait;
use tracing::debug;

use super::{ActionOutcome, ForkAction, ProcessPolicy, Workflow};
use crate::entities::{Repository, RepositoryDetail};
use crate::forge::{DisableResult, Forge};

/// Disables Actions so forks stop running upstream's workflows.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisableActions;

#[async_trait]
impl ForkAction for DisableActions {
    fn workflow(&self) -> Workflow {
        Workflow::DisableActions
    }

    fn policy(&self) -> ProcessPolicy {
        ProcessPolicy::OnceEver
    }

    fn requires_parent(&self) -> bool {
        false
    }

    async fn execute(
        &self,
        forge: &dyn Forge,
        repo: &Repository,
        _detail: Option<&RepositoryDetail>,
    ) -> ActionOutcome {
        match forge.disable_actions(repo).await {
            Ok(DisableResult::Disabled) => {
                ActionOutcome::Success("Disabled GitHub Actions".to_string())
            }
            Ok(DisableResult::AlreadyDisabled) => {
                debug!(repo = %repo.full_name(), "Actions were already disabled");
                ActionOutcome::NoOp("GitHub Actions already disabled".to_string())
            }
            Err(e) => ActionOutcome::Failure(e.into()),
        }
    }
}
