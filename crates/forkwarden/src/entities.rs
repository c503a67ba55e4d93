//! Ledger entities and the remote repository shapes they are built from.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder stored while the upstream of a fork is not known.
pub const UNKNOWN_REPOSITORY: &str = "unknown";

/// A repository as reported by the owner listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub owner: String,
    pub fork: bool,
    pub archived: bool,
}

impl Repository {
    /// `owner/name`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Key under which the repository is stored in a ledger.
    pub fn ledger_key(&self) -> String {
        self.id.to_string()
    }
}

/// Details that are only available by fetching a single repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryDetail {
    /// `owner/name` of the upstream, if the repository is a fork
    pub parent: Option<String>,
    pub default_branch: String,
}

/// Outcome status stored for a fork
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessStatus {
    Success,
    Failed,
    Skipped,
}

impl std::fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failed => write!(f, "failed"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

impl std::str::FromStr for ProcessStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "success" | "succeeded" => Ok(Self::Success),
            "failed" | "failure" => Ok(Self::Failed),
            "skipped" => Ok(Self::Skipped),
            _ => Err(format!("Invalid status: '{s}'")),
        }
    }
}

/// One immutable entry of a fork's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub status: ProcessStatus,
    #[serde(alias = "synced_at")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Last-known state of one fork plus its full history.
///
/// `last_status`, `last_processed_at` and `last_error` mirror the newest
/// record in `history`. Older ledgers written before history was kept have
/// an empty `history` and no status; those forks were only ever written
/// after a successful run, so the status defaults to `success`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub name: String,

    #[serde(default = "unknown_repository")]
    pub original_repository: String,

    #[serde(default = "legacy_status", alias = "last_sync_status")]
    pub last_status: ProcessStatus,

    #[serde(alias = "last_synced", alias = "processed_at")]
    pub last_processed_at: DateTime<Utc>,

    #[serde(default, alias = "error", skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,

    #[serde(default, alias = "sync_history")]
    pub history: Vec<HistoryRecord>,
}

fn unknown_repository() -> String {
    UNKNOWN_REPOSITORY.to_string()
}

fn legacy_status() -> ProcessStatus {
    ProcessStatus::Success
}

impl LedgerEntry {
    /// Whether the fork has ever completed its action successfully.
    pub fn has_succeeded(&self) -> bool {
        self.last_status == ProcessStatus::Success
            || self
                .history
                .iter()
                .any(|record| record.status == ProcessStatus::Success)
    }

    /// Whether the upstream of the fork has been resolved at least once.
    pub fn has_known_origin(&self) -> bool {
        self.original_repository != UNKNOWN_REPOSITORY
    }

    /// Most recent history record
    pub fn latest(&self) -> Option<&HistoryRecord> {
        self.history.last()
    }
}

/// Mapping from fork id to its ledger entry.
///
/// Serialized as a single JSON object keyed by the id. A `BTreeMap` keeps
/// the persisted document stable between runs so it diffs cleanly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    entries: BTreeMap<String, LedgerEntry>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, fork_id: &str) -> Option<&LedgerEntry> {
        self.entries.get(fork_id)
    }

    pub fn contains(&self, fork_id: &str) -> bool {
        self.entries.contains_key(fork_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &LedgerEntry)> {
        self.entries.iter()
    }

    /// Look up an entry by fork id, falling back to the repository name.
    pub fn find(&self, id_or_name: &str) -> Option<(&String, &LedgerEntry)> {
        self.entries.get_key_value(id_or_name).or_else(|| {
            self.entries
                .iter()
                .find(|(_, entry)| entry.name == id_or_name)
        })
    }

    pub(crate) fn entry_or_insert_with(
        &mut self,
        fork_id: String,
        create: impl FnOnce() -> LedgerEntry,
    ) -> &mut LedgerEntry {
        self.entries.entry(fork_id).or_insert_with(create)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_display() {
        for status in [
            ProcessStatus::Success,
            ProcessStatus::Failed,
            ProcessStatus::Skipped,
        ] {
            let parsed: ProcessStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("pending".parse::<ProcessStatus>().is_err());
    }

    #[test]
    fn test_reads_sync_history_document() {
        let json = r#"{
          "123": {
            "name": "serde",
            "original_repository": "serde-rs/serde",
            "last_sync_status": "failed",
            "last_synced": "2025-03-01T10:00:00.000Z",
            "error": "Merge conflict",
            "sync_history": [
              { "status": "success", "synced_at": "2025-02-01T10:00:00.000Z", "message": "Fast-forwarded" },
              { "status": "failed", "synced_at": "2025-03-01T10:00:00.000Z", "error": "Merge conflict" }
            ]
          }
        }"#;

        let ledger: Ledger = serde_json::from_str(json).unwrap();
        let entry = ledger.get("123").unwrap();
        assert_eq!(entry.last_status, ProcessStatus::Failed);
        assert_eq!(entry.last_error.as_deref(), Some("Merge conflict"));
        assert_eq!(entry.history.len(), 2);
        assert_eq!(entry.history[0].message.as_deref(), Some("Fast-forwarded"));
        assert!(entry.has_succeeded());
    }

    #[test]
    fn test_reads_disabled_actions_document() {
        let json = r#"{
          "42": {
            "name": "tokio",
            "original_repository": "unknown",
            "processed_at": "2025-01-05T08:30:00.000Z"
          }
        }"#;

        let ledger: Ledger = serde_json::from_str(json).unwrap();
        let entry = ledger.get("42").unwrap();
        assert_eq!(entry.last_status, ProcessStatus::Success);
        assert!(entry.history.is_empty());
        assert!(entry.has_succeeded());
        assert!(!entry.has_known_origin());
    }

    #[test]
    fn test_optional_fields_are_omitted_when_absent() {
        let record = HistoryRecord {
            status: ProcessStatus::Success,
            timestamp: "2025-01-05T08:30:00Z".parse().unwrap(),
            error: None,
            message: None,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("error").is_none());
        assert!(value.get("message").is_none());
        assert_eq!(value["status"], "success");
    }

    #[test]
    fn test_find_by_id_or_name() {
        let mut ledger = Ledger::new();
        ledger.entry_or_insert_with("7".to_string(), || LedgerEntry {
            name: "ripgrep".to_string(),
            original_repository: "BurntSushi/ripgrep".to_string(),
            last_status: ProcessStatus::Skipped,
            last_processed_at: Utc::now(),
            last_error: None,
            history: Vec::new(),
        });

        assert_eq!(ledger.find("7").map(|(id, _)| id.as_str()), Some("7"));
        assert_eq!(ledger.find("ripgrep").map(|(id, _)| id.as_str()), Some("7"));
        assert!(ledger.find("fd").is_none());
    }
}
