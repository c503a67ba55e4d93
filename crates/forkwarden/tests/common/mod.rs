//! Shared fixtures for forkwarden integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use forkwarden::forge::{DisableResult, MergeUpstream};
use forkwarden::{
    Forge, ForgeError, ForkwardenResult, LedgerStore, Reconciler, Repository, RepositoryDetail,
    RunEvent, RunObserver, RunReport, Workflow,
};

// =============================================================================
// Scripted forge
// =============================================================================

/// A remote call made against the scripted forge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Login,
    List(String),
    Detail(u64),
    Disable(u64),
    Merge(u64, String),
}

/// In-memory `Forge` with per-repository scripted answers.
pub struct ScriptedForge {
    login: Result<String, ForgeError>,
    listing: Mutex<Result<Vec<Repository>, ForgeError>>,
    details: Mutex<HashMap<u64, Result<RepositoryDetail, ForgeError>>>,
    disables: Mutex<HashMap<u64, Result<DisableResult, ForgeError>>>,
    merges: Mutex<HashMap<u64, Result<MergeUpstream, ForgeError>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedForge {
    pub fn new(repositories: Vec<Repository>) -> Self {
        Self {
            login: Ok("octocat".to_string()),
            listing: Mutex::new(Ok(repositories)),
            details: Mutex::new(HashMap::new()),
            disables: Mutex::new(HashMap::new()),
            merges: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_login(error: ForgeError) -> Self {
        Self {
            login: Err(error),
            ..Self::new(Vec::new())
        }
    }

    pub fn set_listing(&self, listing: Result<Vec<Repository>, ForgeError>) {
        *self.listing.lock().unwrap() = listing;
    }

    pub fn set_detail(&self, id: u64, detail: Result<RepositoryDetail, ForgeError>) {
        self.details.lock().unwrap().insert(id, detail);
    }

    pub fn set_disable(&self, id: u64, result: Result<DisableResult, ForgeError>) {
        self.disables.lock().unwrap().insert(id, result);
    }

    pub fn set_merge(&self, id: u64, result: Result<MergeUpstream, ForgeError>) {
        self.merges.lock().unwrap().insert(id, result);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Ids the main action (disable or merge) was invoked on, in order.
    pub fn acted_on(&self) -> Vec<u64> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Disable(id) | Call::Merge(id, _) => Some(id),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Forge for ScriptedForge {
    async fn authenticated_login(&self) -> Result<String, ForgeError> {
        self.record(Call::Login);
        self.login.clone()
    }

    async fn list_owned_repositories(&self, owner: &str) -> Result<Vec<Repository>, ForgeError> {
        self.record(Call::List(owner.to_string()));
        self.listing.lock().unwrap().clone()
    }

    async fn repository_detail(&self, repo: &Repository) -> Result<RepositoryDetail, ForgeError> {
        self.record(Call::Detail(repo.id));
        self.details
            .lock()
            .unwrap()
            .get(&repo.id)
            .cloned()
            .unwrap_or_else(|| {
                Ok(RepositoryDetail {
                    parent: Some(format!("upstream/{}", repo.name)),
                    default_branch: "main".to_string(),
                })
            })
    }

    async fn disable_actions(&self, repo: &Repository) -> Result<DisableResult, ForgeError> {
        self.record(Call::Disable(repo.id));
        self.disables
            .lock()
            .unwrap()
            .get(&repo.id)
            .cloned()
            .unwrap_or(Ok(DisableResult::Disabled))
    }

    async fn merge_upstream(
        &self,
        repo: &Repository,
        branch: &str,
    ) -> Result<MergeUpstream, ForgeError> {
        self.record(Call::Merge(repo.id, branch.to_string()));
        self.merges
            .lock()
            .unwrap()
            .get(&repo.id)
            .cloned()
            .unwrap_or_else(|| {
                Ok(MergeUpstream {
                    merge_type: "fast-forward".to_string(),
                    message: Some(format!(
                        "Successfully fetched and fast-forwarded from upstream upstream:{branch}."
                    )),
                    base_branch: Some(format!("upstream:{branch}")),
                })
            })
    }
}

// =============================================================================
// Recording observer
// =============================================================================

#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<RunEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<RunEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl RunObserver for RecordingObserver {
    fn on_event(&self, event: &RunEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

// =============================================================================
// Helpers
// =============================================================================

pub fn fork(id: u64, name: &str) -> Repository {
    Repository {
        id,
        name: name.to_string(),
        owner: "octocat".to_string(),
        fork: true,
        archived: false,
    }
}

pub fn archived_fork(id: u64, name: &str) -> Repository {
    Repository {
        archived: true,
        ..fork(id, name)
    }
}

pub fn source_repo(id: u64, name: &str) -> Repository {
    Repository {
        fork: false,
        ..fork(id, name)
    }
}

pub fn server_error(message: &str) -> ForgeError {
    ForgeError::Server {
        status: 502,
        message: message.to_string(),
    }
}

/// Run `workflow` once without pacing.
pub async fn run_once(
    forge: &Arc<ScriptedForge>,
    store: Arc<dyn LedgerStore>,
    workflow: Workflow,
) -> ForkwardenResult<RunReport> {
    Reconciler::new(forge.clone(), store, workflow.action())
        .with_request_delay(Duration::ZERO)
        .run()
        .await
}
