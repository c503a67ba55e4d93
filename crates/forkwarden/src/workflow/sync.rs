//! Merge upstream changes into every fork, on every run.

use async_trait::async_trait;

use super::{ActionFailure, ActionOutcome, ForkAction, ProcessPolicy, Workflow};
use crate::entities::{Repository, RepositoryDetail};
use crate::forge::{FailureKind, Forge};

/// Brings each fork's default branch up to date with its upstream.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncUpstream;

#[async_trait]
impl ForkAction for SyncUpstream {
    fn workflow(&self) -> Workflow {
        Workflow::SyncUpstream
    }

    fn policy(&self) -> ProcessPolicy {
        ProcessPolicy::EveryRun
    }

    fn requires_parent(&self) -> bool {
        true
    }

    async fn execute(
        &self,
        forge: &dyn Forge,
        repo: &Repository,
        detail: Option<&RepositoryDetail>,
    ) -> ActionOutcome {
        let Some(detail) = detail else {
            return ActionOutcome::Failure(ActionFailure {
                kind: FailureKind::PolicyRejection,
                message: "Default branch unknown; repository details were not fetched".to_string(),
            });
        };

        match forge.merge_upstream(repo, &detail.default_branch).await {
            Ok(merge) if merge.is_noop() => {
                let message = merge.message.unwrap_or_else(|| match &merge.base_branch {
                    Some(base) => format!("Already up to date with {base}"),
                    None => "Already up to date".to_string(),
                });
                ActionOutcome::NoOp(message)
            }
            Ok(merge) => {
                let message = merge.message.unwrap_or_else(|| match &merge.base_branch {
                    Some(base) => format!("Merged {base} via {}", merge.merge_type),
                    None => format!("Merged via {}", merge.merge_type),
                });
                ActionOutcome::Success(message)
            }
            Err(e) => ActionOutcome::Failure(e.into()),
        }
    }
}
