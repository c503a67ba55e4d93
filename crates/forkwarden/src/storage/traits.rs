//! Storage trait definitions.

use async_trait::async_trait;

use crate::entities::Ledger;
use crate::errors::ForkwardenResult;

/// Durable home of a ledger.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Load the persisted ledger, or an empty one if nothing was persisted yet.
    ///
    /// Fails with `CorruptLedger` when persisted data cannot be parsed; the
    /// caller must abort instead of starting from an empty ledger.
    async fn load(&self) -> ForkwardenResult<Ledger>;

    /// Replace the persisted ledger with `ledger`.
    ///
    /// A crash during the write must leave either the old or the new
    /// document in place, never a partial one.
    async fn save(&self, ledger: &Ledger) -> ForkwardenResult<()>;

    /// Human-readable location, used in logs and errors
    fn location(&self) -> String;
}
