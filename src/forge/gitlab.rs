//! GitLab API interaction
//!
//! GitLab release payloads differ from GitHub's; they are mapped onto the
//! common [`Release`] shape here so the selector never sees the difference.

use super::{drop_prereleases, fetch_body, RepoLocation, RepositoryClient};
use crate::error::{IrError, Result};
use crate::types::{Release, ReleaseAsset, RepoMetadata};
use async_trait::async_trait;
use serde::Deserialize;

pub const GITLAB_API_BASE: &str = "https://gitlab.com/api/v4";

#[derive(Debug, Deserialize)]
struct GitLabProject {
    #[serde(default)]
    path_with_namespace: String,
    #[serde(default)]
    star_count: u64,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitLabRelease {
    #[serde(default)]
    name: Option<String>,
    tag_name: String,
    #[serde(default)]
    released_at: Option<String>,
    #[serde(default)]
    upcoming_release: bool,
    #[serde(default)]
    assets: GitLabAssets,
}

#[derive(Debug, Default, Deserialize)]
struct GitLabAssets {
    #[serde(default)]
    links: Vec<GitLabLink>,
}

#[derive(Debug, Deserialize)]
struct GitLabLink {
    #[serde(default)]
    id: u64,
    name: String,
    url: String,
    #[serde(default)]
    direct_asset_url: Option<String>,
    #[serde(default)]
    link_type: Option<String>,
}

impl GitLabRelease {
    fn into_release(self, source_url: String) -> Release {
        let published_at = self.released_at.unwrap_or_default();
        let assets = self
            .assets
            .links
            .into_iter()
            .map(|link| ReleaseAsset {
                filename: link.name,
                download_url: link
                    .direct_asset_url
                    .filter(|u| !u.is_empty())
                    .unwrap_or(link.url),
                content_type: link.link_type.unwrap_or_default(),
                created_at: published_at.clone(),
                id: link.id,
                ..Default::default()
            })
            .collect();

        Release {
            source_url,
            name: self.name.unwrap_or_default(),
            tag: self.tag_name,
            is_prerelease: self.upcoming_release,
            published_at,
            assets,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct GitLabClient {
    location: RepoLocation,
    api_base: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl GitLabClient {
    pub fn new(repo_url: &str, token: Option<String>, http: reqwest::Client) -> Result<Self> {
        if !repo_url.contains("gitlab.com") {
            return Err(IrError::repository(
                repo_url,
                "repository URL must contain 'gitlab.com'",
            ));
        }
        Ok(GitLabClient {
            location: RepoLocation::parse(repo_url)?,
            api_base: GITLAB_API_BASE.to_string(),
            token,
            http,
        })
    }

    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    fn project_api(&self) -> String {
        format!(
            "{}/projects/{}%2F{}",
            self.api_base, self.location.owner, self.location.repo
        )
    }

    async fn get(&self, url: &str) -> Result<Vec<u8>> {
        let mut request = self.http.get(url).header("Accept", "application/json");
        if let Some(token) = &self.token {
            request = request.header("PRIVATE-TOKEN", token.as_str());
        }
        fetch_body(request, url).await
    }
}

#[async_trait]
impl RepositoryClient for GitLabClient {
    fn source_url(&self) -> String {
        format!(
            "https://gitlab.com/{}/{}",
            self.location.owner, self.location.repo
        )
    }

    async fn repository(&self) -> Result<RepoMetadata> {
        let url = self.project_api();
        let body = self.get(&url).await?;
        let project: GitLabProject = serde_json::from_slice(&body)
            .map_err(|e| IrError::api(&url, format!("error decoding project: {}", e)))?;

        Ok(RepoMetadata {
            full_name: project.path_with_namespace,
            star_count: project.star_count,
            primary_language: String::new(),
            description: project.description.unwrap_or_default(),
        })
    }

    async fn releases(&self, tag: Option<&str>, include_prerelease: bool) -> Result<Vec<Release>> {
        let source_url = self.source_url();
        let tag = tag.filter(|t| !t.is_empty());

        let releases = match tag {
            Some(tag) => {
                let url = format!("{}/releases/{}", self.project_api(), tag);
                let body = self.get(&url).await?;
                let release: GitLabRelease = serde_json::from_slice(&body)
                    .map_err(|e| IrError::api(&url, format!("error decoding release: {}", e)))?;
                vec![release.into_release(source_url)]
            }
            None => {
                let url = format!("{}/releases", self.project_api());
                let body = self.get(&url).await?;
                let releases: Vec<GitLabRelease> = serde_json::from_slice(&body)
                    .map_err(|e| IrError::api(&url, format!("error decoding releases: {}", e)))?;
                releases
                    .into_iter()
                    .map(|r| r.into_release(source_url.clone()))
                    .collect()
            }
        };

        Ok(drop_prereleases(releases, include_prerelease))
    }
}
