//! Repository clients for the forges releases are fetched from.
//!
//! The installer core only consumes the typed results of these clients:
//! repository metadata and a list of releases with their assets.

pub mod github;
pub mod gitlab;

pub use github::GitHubClient;
pub use gitlab::GitLabClient;

use crate::config::ConfigStore;
use crate::error::{IrError, Result};
use crate::types::{Release, RepoMetadata};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Timeout applied to every API request.
pub const API_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Forge {
    GitHub,
    GitLab,
}

impl Forge {
    pub fn detect(url: &str) -> Result<Forge> {
        if url.contains("github.com") {
            Ok(Forge::GitHub)
        } else if url.contains("gitlab.com") {
            Ok(Forge::GitLab)
        } else {
            Err(IrError::repository(
                url,
                "only github.com and gitlab.com repositories are supported",
            ))
        }
    }
}

/// `owner/repo` parsed out of a repository URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoLocation {
    pub owner: String,
    pub repo: String,
}

impl RepoLocation {
    /// Parse `scheme://host/owner/repo`, ignoring a trailing slash or `.git`.
    pub fn parse(url: &str) -> Result<Self> {
        let trimmed = url.trim().trim_end_matches('/');
        let parts: Vec<&str> = trimmed.split('/').collect();
        if parts.len() < 5 {
            return Err(IrError::repository(
                url,
                "expected a URL like https://github.com/owner/repo",
            ));
        }

        let owner = parts[parts.len() - 2];
        let repo = parts[parts.len() - 1].trim_end_matches(".git");
        if owner.is_empty() || repo.is_empty() {
            return Err(IrError::repository(url, "missing owner or repository name"));
        }

        Ok(RepoLocation {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }
}

/// Source of repository metadata and releases.
#[async_trait]
pub trait RepositoryClient: Send + Sync {
    /// Human-facing repository URL, the value recorded in state keys.
    fn source_url(&self) -> String;

    async fn repository(&self) -> Result<RepoMetadata>;

    /// With a tag: exactly that release. Without: the latest release
    /// (GitHub) or every release (GitLab). Pre-releases are dropped unless
    /// `include_prerelease` is set.
    async fn releases(&self, tag: Option<&str>, include_prerelease: bool) -> Result<Vec<Release>>;
}

/// Builds a client for a repository URL.
pub trait ClientFactory: Send + Sync {
    fn client_for(&self, url: &str) -> Result<Arc<dyn RepositoryClient>>;
}

/// Default factory dispatching on the URL's forge with configured tokens.
#[derive(Debug, Clone)]
pub struct ForgeClients {
    http: reqwest::Client,
    github_token: Option<String>,
    gitlab_token: Option<String>,
}

impl ForgeClients {
    pub fn new(github_token: Option<String>, gitlab_token: Option<String>) -> Result<Self> {
        Ok(ForgeClients {
            http: http_client()?,
            github_token,
            gitlab_token,
        })
    }

    pub fn from_config(config: &ConfigStore) -> Result<Self> {
        Self::new(config.token(), config.gitlab_token())
    }
}

impl ClientFactory for ForgeClients {
    fn client_for(&self, url: &str) -> Result<Arc<dyn RepositoryClient>> {
        match Forge::detect(url)? {
            Forge::GitHub => Ok(Arc::new(GitHubClient::new(
                url,
                self.github_token.clone(),
                self.http.clone(),
            )?)),
            Forge::GitLab => Ok(Arc::new(GitLabClient::new(
                url,
                self.gitlab_token.clone(),
                self.http.clone(),
            )?)),
        }
    }
}

pub fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(API_TIMEOUT)
        .user_agent(concat!("install-release/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| IrError::api("(client setup)", e.to_string()))
}

/// Send a prepared GET and return the body of a 2xx response.
pub(crate) async fn fetch_body(request: reqwest::RequestBuilder, url: &str) -> Result<Vec<u8>> {
    tracing::debug!("GET {}", url);
    let response = request
        .send()
        .await
        .map_err(|e| IrError::api(url, format!("request failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(IrError::api(url, "repository or release not found (404)"));
        }
        return Err(IrError::api(
            url,
            format!("request failed with status {}", status),
        ));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| IrError::api(url, format!("error reading response body: {}", e)))?;
    Ok(body.to_vec())
}

pub(crate) fn drop_prereleases(releases: Vec<Release>, include_prerelease: bool) -> Vec<Release> {
    if include_prerelease {
        return releases;
    }
    releases.into_iter().filter(|r| !r.is_prerelease).collect()
}
