//! Runtime configuration.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! environment variables, then command-line overrides applied by the caller.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::errors::{ForkwardenError, ForkwardenResult};
use crate::forge::GITHUB_API_URL;
use crate::workflow::Workflow;

/// Config file picked up from the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "forkwarden.toml";

/// Forkwarden configuration.
#[derive(Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// GitHub token; normally supplied through `GITHUB_TOKEN`
    pub token: Option<String>,

    /// Base URL of the GitHub REST API
    pub api_url: String,

    /// Directory holding the ledger files
    pub storage_dir: PathBuf,

    /// Pause between consecutive forks that hit the API, in milliseconds
    pub request_delay_ms: u64,

    /// Page size for repository listing (1..=100)
    pub per_page: u32,

    /// Ledger of the disable-actions workflow, relative to `storage_dir`
    pub disable_ledger_file: String,

    /// Ledger of the sync workflow, relative to `storage_dir`
    pub sync_ledger_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token: None,
            api_url: GITHUB_API_URL.to_string(),
            storage_dir: PathBuf::from("storage"),
            request_delay_ms: 1000,
            per_page: 100,
            disable_ledger_file: "disabled-actions.json".to_string(),
            sync_ledger_file: "synced-forks-history.json".to_string(),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("api_url", &self.api_url)
            .field("storage_dir", &self.storage_dir)
            .field("request_delay_ms", &self.request_delay_ms)
            .field("per_page", &self.per_page)
            .field("disable_ledger_file", &self.disable_ledger_file)
            .field("sync_ledger_file", &self.sync_ledger_file)
            .finish()
    }
}

impl Config {
    /// Parse a TOML document.
    pub fn from_toml(content: &str) -> ForkwardenResult<Self> {
        toml::from_str(content).map_err(|e| ForkwardenError::Config {
            reason: e.to_string(),
        })
    }

    /// Read a TOML config file.
    pub fn from_file(path: &Path) -> ForkwardenResult<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ForkwardenError::ConfigFile {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        Self::from_toml(&content).map_err(|e| ForkwardenError::ConfigFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Load from `path`, or from [`DEFAULT_CONFIG_FILE`] if it exists, or
    /// fall back to defaults. Environment overrides are applied on top.
    pub fn load(path: Option<&Path>) -> ForkwardenResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply `GITHUB_TOKEN` and `FORKWARDEN_API_URL` from `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(token) = lookup("GITHUB_TOKEN").filter(|t| !t.trim().is_empty()) {
            self.token = Some(token);
        }
        if let Some(url) = lookup("FORKWARDEN_API_URL").filter(|u| !u.trim().is_empty()) {
            self.api_url = url;
        }
    }

    /// Check that a run can be started with this configuration.
    pub fn validate(&self) -> ForkwardenResult<()> {
        if self.token.as_deref().map_or(true, |t| t.trim().is_empty()) {
            return Err(ForkwardenError::Config {
                reason: "GitHub token is missing; set GITHUB_TOKEN or pass --token".to_string(),
            });
        }

        let url = reqwest::Url::parse(&self.api_url).map_err(|e| ForkwardenError::Config {
            reason: format!("Invalid api_url '{}': {e}", self.api_url),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ForkwardenError::Config {
                reason: format!("Invalid api_url '{}': expected http(s)", self.api_url),
            });
        }

        if !(1..=100).contains(&self.per_page) {
            return Err(ForkwardenError::Config {
                reason: format!("per_page must be between 1 and 100, got {}", self.per_page),
            });
        }

        Ok(())
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    /// Path of the ledger file used by `workflow`.
    pub fn ledger_path(&self, workflow: Workflow) -> PathBuf {
        let file = match workflow {
            Workflow::DisableActions => &self.disable_ledger_file,
            Workflow::SyncUpstream => &self.sync_ledger_file,
        };
        self.storage_dir.join(file)
    }
}
