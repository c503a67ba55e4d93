//! File-based ledger storage.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::traits::LedgerStore;
use crate::entities::Ledger;
use crate::errors::{ForkwardenError, ForkwardenResult};

/// Ledger stored as a pretty-printed JSON object on disk.
pub struct FileLedgerStore {
    /// Path to the ledger document
    path: PathBuf,
}

impl FileLedgerStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Get the ledger file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file the new document is staged in before the rename.
    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn persist_error(&self, reason: impl ToString) -> ForkwardenError {
        ForkwardenError::PersistFailure {
            path: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    async fn write_staged(&self, staging: &Path, content: &[u8]) -> std::io::Result<()> {
        let mut file = fs::File::create(staging).await?;
        file.write_all(content).await?;
        file.write_all(b"\n").await?;
        file.sync_all().await
    }

    /// Flush the directory entry so the rename itself survives a crash.
    #[cfg(unix)]
    async fn sync_parent_dir(&self) -> std::io::Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::File::open(dir).await?.sync_all().await
    }

    // Directories cannot be opened as files here; the rename is all we get.
    #[cfg(not(unix))]
    #[allow(clippy::unused_async)]
    async fn sync_parent_dir(&self) -> std::io::Result<()> {
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for FileLedgerStore {
    async fn load(&self) -> ForkwardenResult<Ledger> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No ledger found, starting empty");
                return Ok(Ledger::new());
            }
            Err(e) => {
                return Err(ForkwardenError::LedgerRead {
                    path: self.path.display().to_string(),
                    reason: e.to_string(),
                })
            }
        };

        if content.trim().is_empty() {
            return Err(ForkwardenError::CorruptLedger {
                path: self.path.display().to_string(),
                reason: "file is empty".to_string(),
            });
        }

        let ledger: Ledger =
            serde_json::from_str(&content).map_err(|e| ForkwardenError::CorruptLedger {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })?;

        debug!(path = %self.path.display(), entries = ledger.len(), "Loaded ledger");
        Ok(ledger)
    }

    async fn save(&self, ledger: &Ledger) -> ForkwardenResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| self.persist_error(e))?;
        }

        let content = serde_json::to_vec_pretty(ledger).map_err(|e| self.persist_error(e))?;

        // Stage next to the target so the rename stays on one filesystem
        let staging = self.staging_path();
        if let Err(e) = self.write_staged(&staging, &content).await {
            let _ = fs::remove_file(&staging).await;
            return Err(self.persist_error(e));
        }

        fs::rename(&staging, &self.path)
            .await
            .map_err(|e| self.persist_error(e))?;
        self.sync_parent_dir()
            .await
            .map_err(|e| self.persist_error(e))?;

        debug!(path = %self.path.display(), entries = ledger.len(), "Persisted ledger");
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::entities::ProcessStatus;
    use crate::history::{self, Observation};

    fn sample_ledger() -> Ledger {
        let mut ledger = Ledger::new();
        history::append(
            &mut ledger,
            Observation::new("99", "clap", ProcessStatus::Success)
                .with_origin(Some("clap-rs/clap".to_string()))
                .with_message("Fast-forward"),
        );
        ledger
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty_ledger() {
        let dir = TempDir::new().unwrap();
        let store = FileLedgerStore::new(dir.path().join("ledger.json"));

        let ledger = store.load().await.unwrap();
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = FileLedgerStore::new(dir.path().join("nested").join("ledger.json"));
        let ledger = sample_ledger();

        store.save(&ledger).await.unwrap();
        let loaded = store.load().await.unwrap();

        assert_eq!(loaded, ledger);
        assert!(!store.staging_path().exists());
    }

    #[tokio::test]
    async fn test_persisted_document_is_object_of_objects() {
        let dir = TempDir::new().unwrap();
        let store = FileLedgerStore::new(dir.path().join("ledger.json"));
        store.save(&sample_ledger()).await.unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["99"]["name"], "clap");
        assert_eq!(value["99"]["original_repository"], "clap-rs/clap");
        assert_eq!(value["99"]["history"][0]["message"], "Fast-forward");
        assert!(raw.contains('\n'));
    }

    #[tokio::test]
    async fn test_unparsable_file_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.json");
        std::fs::write(&path, "{ \"1\": [ }").unwrap();

        let err = FileLedgerStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, ForkwardenError::CorruptLedger { .. }));
    }

    #[tokio::test]
    async fn test_wrong_shape_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        let err = FileLedgerStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, ForkwardenError::CorruptLedger { .. }));
    }

    #[tokio::test]
    async fn test_empty_file_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.json");
        std::fs::write(&path, "").unwrap();

        let err = FileLedgerStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, ForkwardenError::CorruptLedger { .. }));
    }

    #[tokio::test]
    async fn test_save_replaces_previous_document() {
        let dir = TempDir::new().unwrap();
        let store = FileLedgerStore::new(dir.path().join("ledger.json"));
        store.save(&sample_ledger()).await.unwrap();

        store.save(&Ledger::new()).await.unwrap();
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_repeated_saves_into_fresh_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage").join("ledger.json");
        let store = FileLedgerStore::new(&path);

        let ledger = sample_ledger();
        store.save(&Ledger::new()).await.unwrap();
        store.save(&ledger).await.unwrap();

        let reopened = FileLedgerStore::new(&path).load().await.unwrap();
        assert_eq!(reopened, ledger);
        let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("ledger.json")]);
    }

    #[tokio::test]
    async fn test_unwritable_location_is_persist_failure() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();
        let store = FileLedgerStore::new(blocker.join("ledger.json"));

        let err = store.save(&sample_ledger()).await.unwrap_err();
        assert!(matches!(err, ForkwardenError::PersistFailure { .. }));
    }
}
