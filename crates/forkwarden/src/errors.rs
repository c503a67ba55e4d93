//! Error types for the forkwarden crate.

use thiserror::Error;

use crate::forge::ForgeError;

/// Fatal errors that abort a whole run.
///
/// Anything that goes wrong for a single fork is recorded in the ledger
/// instead and never surfaces here.
#[derive(Error, Debug)]
pub enum ForkwardenError {
    // Ledger errors
    #[error("Ledger '{path}' is corrupt: {reason}")]
    CorruptLedger { path: String, reason: String },

    #[error("Failed to read ledger '{path}': {reason}")]
    LedgerRead { path: String, reason: String },

    #[error("Failed to persist ledger '{path}': {reason}")]
    PersistFailure { path: String, reason: String },

    // Remote errors
    #[error("Failed to resolve the authenticated account: {0}")]
    Authentication(#[source] ForgeError),

    #[error("Failed to list repositories owned by '{owner}': {source}")]
    Listing {
        owner: String,
        #[source]
        source: ForgeError,
    },

    // Configuration errors
    #[error("Configuration error: {reason}")]
    Config { reason: String },

    #[error("Failed to read configuration file '{path}': {reason}")]
    ConfigFile { path: String, reason: String },
}

impl ForkwardenError {
    /// Whether the error left the ledger on disk possibly behind the remote.
    pub fn history_may_be_incomplete(&self) -> bool {
        matches!(self, Self::PersistFailure { .. })
    }
}

/// Result type alias for forkwarden operations
pub type ForkwardenResult<T> = Result<T, ForkwardenError>;
