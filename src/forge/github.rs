//! GitHub API interaction
//!
//! Queries repository metadata and releases from the GitHub REST API.

use super::{drop_prereleases, fetch_body, RepoLocation, RepositoryClient};
use crate::error::{IrError, Result};
use crate::types::{Release, RepoMetadata};
use async_trait::async_trait;
use serde::Deserialize;

pub const GITHUB_API_BASE: &str = "https://api.github.com";

#[derive(Debug, Deserialize)]
struct GitHubRepo {
    #[serde(default)]
    full_name: String,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GitHubClient {
    location: RepoLocation,
    api_base: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl GitHubClient {
    pub fn new(repo_url: &str, token: Option<String>, http: reqwest::Client) -> Result<Self> {
        if !repo_url.contains("github.com") {
            return Err(IrError::repository(
                repo_url,
                "repository URL must contain 'github.com'",
            ));
        }
        Ok(GitHubClient {
            location: RepoLocation::parse(repo_url)?,
            api_base: GITHUB_API_BASE.to_string(),
            token,
            http,
        })
    }

    /// Point the client at another API host (GitHub Enterprise, tests).
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    fn repo_api(&self) -> String {
        format!(
            "{}/repos/{}/{}",
            self.api_base, self.location.owner, self.location.repo
        )
    }

    async fn get(&self, url: &str) -> Result<Vec<u8>> {
        let mut request = self
            .http
            .get(url)
            .header("Accept", "application/vnd.github.v3+json");
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("token {}", token));
            tracing::debug!("Using GitHub token");
        }

        let body = fetch_body(request, url).await?;

        // GitHub reports some failures (rate limits) as a 2xx JSON `message`.
        if let Ok(serde_json::Value::Object(map)) = serde_json::from_slice(&body) {
            if let Some(message) = map.get("message").and_then(|m| m.as_str()) {
                return Err(IrError::api(url, format!("GitHub API error: {}", message)));
            }
        }

        Ok(body)
    }
}

/// Build the GitHub API URL for a release lookup.
///
/// An empty or missing tag, `latest` or `default` all resolve to the latest release.
pub fn build_gh_release_url(repo_api: &str, tag: Option<&str>) -> String {
    match tag {
        Some(t) if !t.is_empty() && t != "latest" && t != "default" => {
            format!("{}/releases/tags/{}", repo_api, t)
        }
        _ => format!("{}/releases/latest", repo_api),
    }
}

#[async_trait]
impl RepositoryClient for GitHubClient {
    fn source_url(&self) -> String {
        format!(
            "https://github.com/{}/{}",
            self.location.owner, self.location.repo
        )
    }

    async fn repository(&self) -> Result<RepoMetadata> {
        let url = self.repo_api();
        let body = self.get(&url).await?;
        let repo: GitHubRepo = serde_json::from_slice(&body)
            .map_err(|e| IrError::api(&url, format!("error decoding repository: {}", e)))?;

        Ok(RepoMetadata {
            full_name: repo.full_name,
            star_count: repo.stargazers_count,
            primary_language: repo.language.unwrap_or_default(),
            description: repo.description.unwrap_or_default(),
        })
    }

    async fn releases(&self, tag: Option<&str>, include_prerelease: bool) -> Result<Vec<Release>> {
        let url = build_gh_release_url(&self.repo_api(), tag);
        tracing::debug!("Fetching GitHub release info from: {}", url);

        let body = self.get(&url).await?;
        let mut release: Release = serde_json::from_slice(&body)
            .map_err(|e| IrError::api(&url, format!("error decoding release: {}", e)))?;
        release.source_url = self.source_url();

        Ok(drop_prereleases(vec![release], include_prerelease))
    }
}
