//! Remote source-control host the forks live on.
//!
//! The reconciliation core only talks to the host through [`Forge`]; the
//! GitHub REST implementation lives in [`github`].

mod github;

use async_trait::async_trait;
use thiserror::Error;

use crate::entities::{Repository, RepositoryDetail};

pub use github::{GitHubClient, GITHUB_API_URL};

/// How a failed remote call should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Network, authentication or rate-limit trouble; may clear up by itself.
    Transient,
    /// The host refused the operation for this repository.
    PolicyRejection,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transient => write!(f, "transient"),
            Self::PolicyRejection => write!(f, "policy-rejection"),
        }
    }
}

/// Errors returned by a [`Forge`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ForgeError {
    #[error("HTTP request failed: {0}")]
    Transport(String),

    #[error("Authentication failed: {message}")]
    Unauthorized { message: String },

    #[error("Rate limit exceeded: {message}")]
    RateLimited { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("GitHub API error: {status} - {message}")]
    Rejected { status: u16, message: String },

    #[error("GitHub API error: {status} - {message}")]
    Server { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl ForgeError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transport(_)
            | Self::Unauthorized { .. }
            | Self::RateLimited { .. }
            | Self::Server { .. }
            | Self::Decode(_) => FailureKind::Transient,
            Self::Forbidden { .. } | Self::NotFound { .. } | Self::Rejected { .. } => {
                FailureKind::PolicyRejection
            }
        }
    }
}

impl From<reqwest::Error> for ForgeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Result of asking the host to turn off automation for a repository
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisableResult {
    Disabled,
    AlreadyDisabled,
}

/// Result of merging upstream changes into a fork's default branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeUpstream {
    /// `fast-forward`, `merge` or `none`
    pub merge_type: String,
    pub message: Option<String>,
    pub base_branch: Option<String>,
}

impl MergeUpstream {
    /// The fork was already up to date.
    pub fn is_noop(&self) -> bool {
        self.merge_type == "none"
    }
}

/// Capabilities the reconciliation core needs from the host.
#[async_trait]
pub trait Forge: Send + Sync {
    /// Login of the account the credentials belong to
    async fn authenticated_login(&self) -> Result<String, ForgeError>;

    /// Every repository owned by `owner`, in the host's listing order.
    async fn list_owned_repositories(&self, owner: &str) -> Result<Vec<Repository>, ForgeError>;

    async fn repository_detail(&self, repo: &Repository) -> Result<RepositoryDetail, ForgeError>;

    async fn disable_actions(&self, repo: &Repository) -> Result<DisableResult, ForgeError>;

    async fn merge_upstream(
        &self,
        repo: &Repository,
        branch: &str,
    ) -> Result<MergeUpstream, ForgeError>;
}
