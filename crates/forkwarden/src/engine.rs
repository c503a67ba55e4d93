//! Reconciliation of the ledger against the live list of forks.
//!
//! A run loads the ledger, lists the account's repositories, and walks the
//! forks one at a time in listing order:
//!
//! - archived forks are recorded as skipped and never acted on;
//! - under [`ProcessPolicy::OnceEver`] a fork whose action already succeeded
//!   is skipped without any remote call;
//! - every other fork is acted on and its outcome appended to its history.
//!
//! A fork's failure is recorded and never stops the run. The ledger is
//! persisted after every recorded fork, so an interrupted run loses at most
//! the fork in flight.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::classifier::{classify, Classification, Disposition};
use crate::entities::{Ledger, LedgerEntry, ProcessStatus, Repository, UNKNOWN_REPOSITORY};
use crate::errors::{ForkwardenError, ForkwardenResult};
use crate::forge::Forge;
use crate::history::{self, Observation};
use crate::observer::{RunEvent, RunObserver, TracingObserver};
use crate::storage::LedgerStore;
use crate::summary::RunSummary;
use crate::workflow::{ActionOutcome, ForkAction, ProcessPolicy};

/// Pause between consecutive forks that hit the remote.
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(1000);

/// Ledger and counts at the end of a run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub owner: String,
    pub ledger: Ledger,
    pub summary: RunSummary,
}

/// What happened to a single fork.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Skipped,
    Archived,
    NoParent,
    Succeeded,
    UpToDate,
    Failed,
}

impl Step {
    /// Whether the fork got a new history record.
    fn recorded(self) -> bool {
        self != Self::Skipped
    }

    fn tally(self, summary: &mut RunSummary) {
        match self {
            Self::Skipped | Self::NoParent => summary.skipped += 1,
            Self::Archived => summary.archived += 1,
            Self::Succeeded => summary.succeeded += 1,
            Self::UpToDate => {
                summary.succeeded += 1;
                summary.up_to_date += 1;
            }
            Self::Failed => summary.failed += 1,
        }
    }
}

/// Spaces out remote calls by a fixed delay.
struct Pacer {
    delay: Duration,
    primed: bool,
}

impl Pacer {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            primed: false,
        }
    }

    /// Wait before a fork's remote calls; the first fork goes immediately.
    async fn ready(&mut self) {
        if self.primed && !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.primed = true;
    }
}

/// Drives one workflow over every fork of the authenticated account.
pub struct Reconciler {
    forge: Arc<dyn Forge>,
    store: Arc<dyn LedgerStore>,
    action: Box<dyn ForkAction>,
    observer: Arc<dyn RunObserver>,
    request_delay: Duration,
}

impl Reconciler {
    pub fn new(
        forge: Arc<dyn Forge>,
        store: Arc<dyn LedgerStore>,
        action: Box<dyn ForkAction>,
    ) -> Self {
        Self {
            forge,
            store,
            action,
            observer: Arc::new(TracingObserver),
            request_delay: DEFAULT_REQUEST_DELAY,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    /// Run the workflow end to end.
    ///
    /// Aborts before touching anything if the ledger cannot be loaded, and
    /// aborts if the account or its repositories cannot be listed.
    pub async fn run(&self) -> ForkwardenResult<RunReport> {
        let ledger = self.store.load().await?;
        info!(
            ledger = %self.store.location(),
            entries = ledger.len(),
            "Loaded ledger"
        );

        let owner = self
            .forge
            .authenticated_login()
            .await
            .map_err(ForkwardenError::Authentication)?;

        let repositories = self
            .forge
            .list_owned_repositories(&owner)
            .await
            .map_err(|source| ForkwardenError::Listing {
                owner: owner.clone(),
                source,
            })?;

        let classification = classify(repositories);
        self.reconcile(&owner, ledger, &classification).await
    }

    /// Reconcile an already loaded ledger against a classified listing.
    pub async fn reconcile(
        &self,
        owner: &str,
        mut ledger: Ledger,
        classification: &Classification,
    ) -> ForkwardenResult<RunReport> {
        self.observer.on_event(&RunEvent::Started {
            workflow: self.action.workflow(),
            owner: owner.to_string(),
            forks: classification.count(Disposition::Candidate)
                + classification.count(Disposition::Archived),
            archived: classification.count(Disposition::Archived),
            non_forks: classification.count(Disposition::NotAFork),
        });

        let mut summary = RunSummary::default();
        let mut pacer = Pacer::new(self.request_delay);

        for (disposition, repo) in classification.forks() {
            let step = match disposition {
                Disposition::Archived => {
                    pacer.ready().await;
                    self.record_archived(&mut ledger, repo).await
                }
                Disposition::Candidate => self.process(&mut ledger, repo, &mut pacer).await,
                Disposition::NotAFork => continue,
            };

            step.tally(&mut summary);
            if step.recorded() {
                self.store.save(&ledger).await?;
            }
        }

        self.store.save(&ledger).await?;
        info!(ledger = %self.store.location(), entries = ledger.len(), "Persisted ledger");

        self.observer.on_event(&RunEvent::Finished { summary });

        Ok(RunReport {
            owner: owner.to_string(),
            ledger,
            summary,
        })
    }

    async fn process(&self, ledger: &mut Ledger, repo: &Repository, pacer: &mut Pacer) -> Step {
        let key = repo.ledger_key();

        if self.action.policy() == ProcessPolicy::OnceEver
            && ledger.get(&key).is_some_and(LedgerEntry::has_succeeded)
        {
            self.observer.on_event(&RunEvent::AlreadyProcessed {
                fork_id: repo.id,
                repo: repo.full_name(),
            });
            return Step::Skipped;
        }

        pacer.ready().await;

        if !self.action.requires_parent() {
            let outcome = self.action.execute(self.forge.as_ref(), repo, None).await;
            let origin = self.resolve_origin(repo).await;
            return self.record_outcome(ledger, repo, origin, outcome);
        }

        let detail = match self.forge.repository_detail(repo).await {
            Ok(detail) => detail,
            Err(e) => {
                let error = format!("Failed to get repository details: {e}");
                self.observer.on_event(&RunEvent::Failed {
                    fork_id: repo.id,
                    repo: repo.full_name(),
                    kind: e.kind(),
                    error: error.clone(),
                });
                history::append(
                    ledger,
                    Observation::new(key, &repo.name, ProcessStatus::Failed).with_error(error),
                );
                return Step::Failed;
            }
        };

        let Some(parent) = detail.parent.clone() else {
            self.observer.on_event(&RunEvent::NoParent {
                fork_id: repo.id,
                repo: repo.full_name(),
            });
            history::append(
                ledger,
                Observation::new(key, &repo.name, ProcessStatus::Skipped)
                    .with_error("No parent repository found"),
            );
            return Step::NoParent;
        };

        let outcome = self
            .action
            .execute(self.forge.as_ref(), repo, Some(&detail))
            .await;
        self.record_outcome(ledger, repo, Some(parent), outcome)
    }

    fn record_outcome(
        &self,
        ledger: &mut Ledger,
        repo: &Repository,
        origin: Option<String>,
        outcome: ActionOutcome,
    ) -> Step {
        let observation =
            Observation::new(repo.ledger_key(), &repo.name, outcome.status()).with_origin(origin);

        match outcome {
            ActionOutcome::Success(message) => {
                let entry = history::append(ledger, observation.with_message(message.clone()));
                self.observer.on_event(&RunEvent::Succeeded {
                    fork_id: repo.id,
                    repo: repo.full_name(),
                    original_repository: entry.original_repository.clone(),
                    message,
                });
                Step::Succeeded
            }
            ActionOutcome::NoOp(message) => {
                history::append(ledger, observation.with_message(message.clone()));
                self.observer.on_event(&RunEvent::UpToDate {
                    fork_id: repo.id,
                    repo: repo.full_name(),
                    message,
                });
                Step::UpToDate
            }
            ActionOutcome::Failure(failure) => {
                history::append(ledger, observation.with_error(failure.message.clone()));
                self.observer.on_event(&RunEvent::Failed {
                    fork_id: repo.id,
                    repo: repo.full_name(),
                    kind: failure.kind,
                    error: failure.message,
                });
                Step::Failed
            }
        }
    }

    async fn record_archived(&self, ledger: &mut Ledger, repo: &Repository) -> Step {
        let origin = self.resolve_origin(repo).await;
        let entry = history::append(
            ledger,
            Observation::new(repo.ledger_key(), &repo.name, ProcessStatus::Skipped)
                .with_origin(origin)
                .with_message("Repository is archived"),
        );

        self.observer.on_event(&RunEvent::Archived {
            fork_id: repo.id,
            repo: repo.full_name(),
            original_repository: entry.original_repository.clone(),
        });
        Step::Archived
    }

    /// Best-effort upstream lookup. `None` leaves the ledger's current value.
    async fn resolve_origin(&self, repo: &Repository) -> Option<String> {
        match self.forge.repository_detail(repo).await {
            Ok(detail) => {
                if detail.parent.is_none() {
                    debug!(repo = %repo.full_name(), "Repository has no parent");
                }
                detail.parent
            }
            Err(e) => {
                debug!(
                    repo = %repo.full_name(),
                    error = %e,
                    fallback = UNKNOWN_REPOSITORY,
                    "Could not fetch parent repository"
                );
                self.observer.on_event(&RunEvent::ParentUnresolved {
                    fork_id: repo.id,
                    repo: repo.full_name(),
                    error: e.to_string(),
                });
                None
            }
        }
    }
}
