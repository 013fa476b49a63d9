//! GitLab v4 REST client.

use crate::payload::parse_list;
use async_trait::async_trait;
use codescout_core::remote::PAGE_SIZE;
use codescout_core::{Credential, DirectoryClient, Error, Group, Project, Result, SearchHit};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Header carrying the personal access token.
pub const TOKEN_HEADER: &str = "PRIVATE-TOKEN";

#[derive(Clone)]
pub struct GitlabClient {
    http: reqwest::Client,
    api_base: String,
}

impl GitlabClient {
    /// Create a client for an instance such as `https://gitlab.com`.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(Error::Config("base URL is empty".to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self::with_http(base_url, http))
    }

    /// Use a preconfigured `reqwest::Client`.
    pub fn with_http(base_url: &str, http: reqwest::Client) -> Self {
        Self {
            http,
            api_base: format!("{}/api/v4", base_url.trim().trim_end_matches('/')),
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        what: &str,
        path: &str,
        credential: &Credential,
        query: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let url = format!("{}{}", self.api_base, path);
        debug!("GET {} {:?}", url, query);

        let resp = self
            .http
            .get(&url)
            .header(TOKEN_HEADER, credential.expose())
            .query(query)
            .send()
            .await
            .map_err(|e| Error::Transport(format!("{} request failed: {}", what, e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Remote {
                status: status.as_u16(),
                message: format!("{} request failed: {} - {}", what, status, body),
            });
        }

        let body = resp
            .text()
            .await
            .map_err(|e| Error::Transport(format!("{} response unreadable: {}", what, e)))?;
        parse_list(what, &body)
    }
}

fn page_query(page: u32) -> Vec<(&'static str, String)> {
    vec![
        ("per_page", PAGE_SIZE.to_string()),
        ("page", page.to_string()),
    ]
}

fn search_query(keyword: &str, git_ref: Option<&str>) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("scope", "blobs".to_string()),
        ("search", keyword.to_string()),
    ];
    if let Some(git_ref) = git_ref.filter(|r| !r.is_empty()) {
        query.push(("ref", git_ref.to_string()));
    }
    query
}

#[async_trait]
impl DirectoryClient for GitlabClient {
    async fn list_groups(&self, credential: &Credential, page: u32) -> Result<Vec<Group>> {
        self.get_list("groups", "/groups", credential, &page_query(page))
            .await
    }

    async fn list_projects(
        &self,
        group_id: u64,
        credential: &Credential,
        page: u32,
    ) -> Result<Vec<Project>> {
        let path = format!("/groups/{}/projects", group_id);
        self.get_list("projects", &path, credential, &page_query(page))
            .await
    }

    async fn search_code(
        &self,
        project_id: u64,
        keyword: &str,
        credential: &Credential,
        git_ref: Option<&str>,
    ) -> Result<Vec<SearchHit>> {
        let path = format!("/projects/{}/search", project_id);
        self.get_list("search", &path, credential, &search_query(keyword, git_ref))
            .await
    }
}
