//! GitHub REST API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{DisableResult, Forge, ForgeError, MergeUpstream};
use crate::entities::{Repository, RepositoryDetail};

pub const GITHUB_API_URL: &str = "https://api.github.com";

const MAX_PER_PAGE: u32 = 100;

/// GitHub API client for fork maintenance.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
    per_page: u32,
}

#[derive(Debug, Deserialize)]
struct Account {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RepositoryItem {
    id: u64,
    name: String,
    owner: Account,
    #[serde(default)]
    fork: bool,
    #[serde(default)]
    archived: bool,
}

#[derive(Debug, Deserialize)]
struct ParentRepository {
    name: String,
    owner: Account,
}

#[derive(Debug, Deserialize)]
struct RepositoryResponse {
    default_branch: String,
    #[serde(default)]
    parent: Option<ParentRepository>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ActionsPermissions {
    enabled: bool,
}

#[derive(Debug, Serialize)]
struct MergeUpstreamRequest<'a> {
    branch: &'a str,
}

#[derive(Debug, Deserialize)]
struct MergeUpstreamResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    merge_type: Option<String>,
    #[serde(default)]
    base_branch: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl GitHubClient {
    /// Create a client for api.github.com.
    pub fn new(token: &str) -> Result<Self, ForgeError> {
        Self::with_base_url(token, GITHUB_API_URL)
    }

    /// Create a client for a GitHub-compatible API at `base_url`.
    pub fn with_base_url(token: &str, base_url: &str) -> Result<Self, ForgeError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("forkwarden/", env!("CARGO_PKG_VERSION"))),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            per_page: MAX_PER_PAGE,
        })
    }

    /// Page size used when listing repositories (1..=100).
    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.clamp(1, MAX_PER_PAGE);
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Turn a non-success response into a classified error.
    async fn check(response: Response) -> Result<Response, ForgeError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let budget_exhausted = response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == "0");

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.message)
            .unwrap_or(body);

        Err(match status {
            StatusCode::UNAUTHORIZED => ForgeError::Unauthorized { message },
            StatusCode::TOO_MANY_REQUESTS => ForgeError::RateLimited { message },
            StatusCode::FORBIDDEN if budget_exhausted => ForgeError::RateLimited { message },
            StatusCode::FORBIDDEN => ForgeError::Forbidden { message },
            StatusCode::NOT_FOUND => ForgeError::NotFound { message },
            s if s.is_server_error() => ForgeError::Server {
                status: s.as_u16(),
                message,
            },
            s => ForgeError::Rejected {
                status: s.as_u16(),
                message,
            },
        })
    }
}

#[async_trait]
impl Forge for GitHubClient {
    #[instrument(skip(self))]
    async fn authenticated_login(&self) -> Result<String, ForgeError> {
        let response = self
            .client
            .get(self.url("/user"))
            .header(AUTHORIZATION, self.bearer())
            .send()
            .await?;

        let account: Account = Self::check(response).await?.json().await?;
        Ok(account.login)
    }

    #[instrument(skip(self))]
    async fn list_owned_repositories(&self, owner: &str) -> Result<Vec<Repository>, ForgeError> {
        let url = self.url(&format!("/users/{owner}/repos"));
        let per_page = self.per_page.to_string();
        let mut repositories = Vec::new();
        let mut page: u32 = 1;

        loop {
            let response = self
                .client
                .get(&url)
                .header(AUTHORIZATION, self.bearer())
                .query(&[
                    ("type", "owner"),
                    ("per_page", per_page.as_str()),
                    ("page", page.to_string().as_str()),
                ])
                .send()
                .await?;

            let batch: Vec<RepositoryItem> = Self::check(response).await?.json().await?;
            let count = batch.len();
            debug!(page, count, "Fetched repository page");

            repositories.extend(batch.into_iter().map(|item| Repository {
                id: item.id,
                name: item.name,
                owner: item.owner.login,
                fork: item.fork,
                archived: item.archived,
            }));

            if count < self.per_page as usize {
                break;
            }
            page += 1;
        }

        Ok(repositories)
    }

    #[instrument(skip(self, repo), fields(repo = %repo.full_name()))]
    async fn repository_detail(&self, repo: &Repository) -> Result<RepositoryDetail, ForgeError> {
        let response = self
            .client
            .get(self.url(&format!("/repos/{}/{}", repo.owner, repo.name)))
            .header(AUTHORIZATION, self.bearer())
            .send()
            .await?;

        let detail: RepositoryResponse = Self::check(response).await?.json().await?;
        Ok(RepositoryDetail {
            parent: detail
                .parent
                .map(|p| format!("{}/{}", p.owner.login, p.name)),
            default_branch: detail.default_branch,
        })
    }

    #[instrument(skip(self, repo), fields(repo = %repo.full_name()))]
    async fn disable_actions(&self, repo: &Repository) -> Result<DisableResult, ForgeError> {
        let url = self.url(&format!(
            "/repos/{}/{}/actions/permissions",
            repo.owner, repo.name
        ));

        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, self.bearer())
            .send()
            .await?;
        let current: ActionsPermissions = Self::check(response).await?.json().await?;

        if !current.enabled {
            return Ok(DisableResult::AlreadyDisabled);
        }

        let response = self
            .client
            .put(&url)
            .header(AUTHORIZATION, self.bearer())
            .json(&ActionsPermissions { enabled: false })
            .send()
            .await?;
        Self::check(response).await?;

        Ok(DisableResult::Disabled)
    }

    #[instrument(skip(self, repo), fields(repo = %repo.full_name()))]
    async fn merge_upstream(
        &self,
        repo: &Repository,
        branch: &str,
    ) -> Result<MergeUpstream, ForgeError> {
        let response = self
            .client
            .post(self.url(&format!(
                "/repos/{}/{}/merge-upstream",
                repo.owner, repo.name
            )))
            .header(AUTHORIZATION, self.bearer())
            .json(&MergeUpstreamRequest { branch })
            .send()
            .await?;

        let merge: MergeUpstreamResponse = Self::check(response).await?.json().await?;
        Ok(MergeUpstream {
            merge_type: merge.merge_type.unwrap_or_else(|| "none".to_string()),
            message: merge.message.filter(|m| !m.is_empty()),
            base_branch: merge.base_branch,
        })
    }
}
