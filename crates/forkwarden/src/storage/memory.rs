//! In-memory ledger storage.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use super::traits::LedgerStore;
use crate::entities::Ledger;
use crate::errors::{ForkwardenError, ForkwardenResult};

/// Keeps the "persisted" ledger in memory.
#[derive(Default)]
pub struct MemoryLedgerStore {
    ledger: Mutex<Ledger>,
    saves: AtomicUsize,
    reject_saves: AtomicBool,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a ledger from an earlier run
    pub fn with_ledger(ledger: Ledger) -> Self {
        Self {
            ledger: Mutex::new(ledger),
            ..Self::default()
        }
    }

    /// Copy of the last saved ledger
    pub fn snapshot(&self) -> Ledger {
        self.ledger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Make every following save fail with `PersistFailure`.
    pub fn reject_saves(&self, reject: bool) {
        self.reject_saves.store(reject, Ordering::SeqCst);
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn load(&self) -> ForkwardenResult<Ledger> {
        Ok(self.snapshot())
    }

    async fn save(&self, ledger: &Ledger) -> ForkwardenResult<()> {
        if self.reject_saves.load(Ordering::SeqCst) {
            return Err(ForkwardenError::PersistFailure {
                path: self.location(),
                reason: "store is rejecting writes".to_string(),
            });
        }

        *self.ledger.lock().unwrap_or_else(PoisonError::into_inner) = ledger.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
