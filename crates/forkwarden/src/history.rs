//! Append-only outcome history kept inside each ledger entry.

use chrono::{DateTime, Utc};

use crate::entities::{HistoryRecord, Ledger, LedgerEntry, ProcessStatus, UNKNOWN_REPOSITORY};

/// One outcome to be appended to a fork's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub fork_id: String,
    pub name: String,
    /// Upstream resolved during this run. `None` keeps whatever the entry
    /// already knows, or `unknown` for a new entry.
    pub original_repository: Option<String>,
    pub status: ProcessStatus,
    pub error: Option<String>,
    pub message: Option<String>,
}

impl Observation {
    pub fn new(fork_id: impl Into<String>, name: impl Into<String>, status: ProcessStatus) -> Self {
        Self {
            fork_id: fork_id.into(),
            name: name.into(),
            original_repository: None,
            status,
            error: None,
            message: None,
        }
    }

    pub fn with_origin(mut self, original_repository: Option<String>) -> Self {
        self.original_repository = original_repository;
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into()).filter(|e: &String| !e.is_empty());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into()).filter(|m: &String| !m.is_empty());
        self
    }
}

/// Append an observation stamped with the current time.
pub fn append(ledger: &mut Ledger, observation: Observation) -> &LedgerEntry {
    append_at(ledger, observation, Utc::now())
}

/// Append an observation at `at`.
///
/// Creates the entry on first observation. Existing records are never
/// touched; the new record's timestamp is clamped so it never precedes the
/// entry's previous one. An entry loaded without any history first gets a
/// record of its stored state, so an earlier success is not lost.
pub fn append_at(ledger: &mut Ledger, observation: Observation, at: DateTime<Utc>) -> &LedgerEntry {
    let Observation {
        fork_id,
        name,
        original_repository,
        status,
        error,
        message,
    } = observation;

    let existed = ledger.contains(&fork_id);
    let entry = ledger.entry_or_insert_with(fork_id, || LedgerEntry {
        name: name.clone(),
        original_repository: UNKNOWN_REPOSITORY.to_string(),
        last_status: status,
        last_processed_at: at,
        last_error: None,
        history: Vec::new(),
    });

    if existed && entry.history.is_empty() {
        entry.history.push(HistoryRecord {
            status: entry.last_status,
            timestamp: entry.last_processed_at,
            error: entry.last_error.clone(),
            message: None,
        });
    }

    let at = at.max(entry.last_processed_at);

    entry.name = name;
    if let Some(origin) = original_repository.filter(|o| o != UNKNOWN_REPOSITORY) {
        entry.original_repository = origin;
    }
    entry.last_status = status;
    entry.last_processed_at = at;
    entry.last_error.clone_from(&error);

    entry.history.push(HistoryRecord {
        status,
        timestamp: at,
        error,
        message,
    });

    entry
}
