#![warn(clippy::pedantic)]
// Allow common pedantic lints that don't affect correctness
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]

//! # Forkwarden
//!
//! Keeps a local ledger of every fork owned by a GitHub account and applies
//! idempotent maintenance to them.
//!
//! This crate provides:
//! - A per-fork ledger with an append-only outcome history
//! - Classification of an owner listing into live forks, archived forks and
//!   non-forks
//! - Two workflows: disable GitHub Actions once, sync with upstream every run
//! - A reconciliation engine that records every outcome and persists after
//!   each fork
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use forkwarden::{FileLedgerStore, GitHubClient, Reconciler, Workflow};
//!
//! let forge = Arc::new(GitHubClient::new(&token)?);
//! let store = Arc::new(FileLedgerStore::new("storage/synced-forks-history.json"));
//! let report = Reconciler::new(forge, store, Workflow::SyncUpstream.action())
//!     .run()
//!     .await?;
//! println!("{} synced", report.summary.succeeded);
//! ```

// Core entities
pub mod entities;

// Error types
pub mod errors;

// Configuration
pub mod config;

// Storage layer
pub mod storage;

// Remote host
pub mod forge;

// Reconciliation
pub mod classifier;
pub mod engine;
pub mod history;
pub mod observer;
pub mod summary;
pub mod workflow;

// Re-export key types for convenience
pub use classifier::{classify, Classification, Disposition};
pub use config::Config;
pub use engine::{Reconciler, RunReport};
pub use entities::{
    HistoryRecord, Ledger, LedgerEntry, ProcessStatus, Repository, RepositoryDetail,
    UNKNOWN_REPOSITORY,
};
pub use errors::{ForkwardenError, ForkwardenResult};
pub use forge::{FailureKind, Forge, ForgeError, GitHubClient};
pub use observer::{RunEvent, RunObserver, TracingObserver};
pub use storage::{FileLedgerStore, LedgerStore, MemoryLedgerStore};
pub use summary::RunSummary;
pub use workflow::{ActionOutcome, ForkAction, ProcessPolicy, Workflow};
