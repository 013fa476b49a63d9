//! Test utilities for CodeScout.
//!
//! Provides model fixtures and a scripted in-memory [`DirectoryClient`].

use crate::credential::Credential;
use crate::error::{Error, Result};
use crate::model::{Group, Namespace, Project, SearchHit};
use crate::remote::{DirectoryClient, PAGE_SIZE};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Test fixture for creating sample inventory and matches.
pub struct TestFixtures;

impl TestFixtures {
    pub fn group(id: u64, full_path: &str) -> Group {
        Group::new(id, full_path)
    }

    /// `count` groups with ids starting at `first_id`.
    pub fn groups(first_id: u64, count: usize) -> Vec<Group> {
        (0..count as u64)
            .map(|i| Group::new(first_id + i, format!("group-{}", first_id + i)))
            .collect()
    }

    /// A project under `namespace`, hosted at `https://gitlab.example.com`.
    pub fn named_project(id: u64, name: &str, namespace: Namespace) -> Project {
        let path_with_namespace = format!("{}/{}", namespace.full_path, name);
        Project {
            id,
            name: name.to_string(),
            web_url: format!("https://gitlab.example.com/{}", path_with_namespace),
            path_with_namespace,
            namespace,
            name_with_namespace: None,
        }
    }

    pub fn project(id: u64, group_id: u64, group_path: &str) -> Project {
        Self::named_project(
            id,
            &format!("project-{}", id),
            Namespace {
                id: group_id,
                full_path: group_path.to_string(),
            },
        )
    }

    /// Projects from `(project id, group id, group path)` triples.
    pub fn projects(specs: &[(u64, u64, &str)]) -> Vec<Project> {
        specs
            .iter()
            .map(|(id, gid, path)| Self::project(*id, *gid, path))
            .collect()
    }

    pub fn hit(path: &str, data: &str) -> SearchHit {
        SearchHit {
            path: path.to_string(),
            git_ref: "main".to_string(),
            data: data.to_string(),
            startline: 1,
        }
    }
}

/// A recorded call to the mock client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListGroups { page: u32 },
    ListProjects { group_id: u64, page: u32 },
    SearchCode {
        project_id: u64,
        keyword: String,
        token: String,
        git_ref: Option<String>,
    },
}

#[derive(Default)]
struct Script {
    group_pages: Vec<Vec<Group>>,
    groups_always_full: bool,
    projects: HashMap<u64, Vec<Project>>,
    failing_groups: HashSet<u64>,
    hits: HashMap<u64, Vec<SearchHit>>,
    failing_projects: HashSet<u64>,
    panicking_projects: HashSet<u64>,
    search_latency: Duration,
    listing_latency: Duration,
}

/// Scripted [`DirectoryClient`] that records calls and tracks how many
/// searches and project listings are in flight at once.
#[derive(Default)]
pub struct MockDirectoryClient {
    script: Mutex<Script>,
    calls: Mutex<Vec<Call>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    listings_in_flight: AtomicUsize,
    peak_listings: AtomicUsize,
}

impl MockDirectoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap()
    }

    /// Serve these pages from `list_groups`, page 1 first.
    pub fn with_group_pages(self, pages: Vec<Vec<Group>>) -> Self {
        self.script().group_pages = pages;
        self
    }

    /// Answer every `list_groups` call with a full page.
    pub fn with_endless_groups(self) -> Self {
        self.script().groups_always_full = true;
        self
    }

    pub fn with_projects(self, group_id: u64, projects: Vec<Project>) -> Self {
        self.script().projects.insert(group_id, projects);
        self
    }

    pub fn with_failing_group(self, group_id: u64) -> Self {
        self.script().failing_groups.insert(group_id);
        self
    }

    pub fn with_hits(self, project_id: u64, hits: Vec<SearchHit>) -> Self {
        self.script().hits.insert(project_id, hits);
        self
    }

    pub fn with_failing_project(self, project_id: u64) -> Self {
        self.script().failing_projects.insert(project_id);
        self
    }

    /// Panic inside `search_code` for this project.
    pub fn with_panicking_project(self, project_id: u64) -> Self {
        self.script().panicking_projects.insert(project_id);
        self
    }

    pub fn with_search_latency(self, latency: Duration) -> Self {
        self.script().search_latency = latency;
        self
    }

    pub fn with_listing_latency(self, latency: Duration) -> Self {
        self.script().listing_latency = latency;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn search_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::SearchCode { .. }))
            .collect()
    }

    pub fn group_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::ListGroups { .. }))
            .count()
    }

    /// Highest number of simultaneously unresolved searches observed.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously unresolved project listings observed.
    pub fn peak_listings_in_flight(&self) -> usize {
        self.peak_listings.load(Ordering::SeqCst)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl DirectoryClient for MockDirectoryClient {
    async fn list_groups(&self, _credential: &Credential, page: u32) -> Result<Vec<Group>> {
        self.record(Call::ListGroups { page });
        let script = self.script();
        if script.groups_always_full {
            return Ok(TestFixtures::groups(page as u64 * 1000, PAGE_SIZE));
        }
        Ok(script
            .group_pages
            .get(page as usize - 1)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_projects(
        &self,
        group_id: u64,
        _credential: &Credential,
        page: u32,
    ) -> Result<Vec<Project>> {
        self.record(Call::ListProjects { group_id, page });

        let now = self.listings_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_listings.fetch_max(now, Ordering::SeqCst);

        let (latency, failing, all) = {
            let script = self.script();
            (
                script.listing_latency,
                script.failing_groups.contains(&group_id),
                script.projects.get(&group_id).cloned().unwrap_or_default(),
            )
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        self.listings_in_flight.fetch_sub(1, Ordering::SeqCst);

        if failing {
            return Err(Error::Remote {
                status: 403,
                message: "403 Forbidden".to_string(),
            });
        }
        Ok(all
            .into_iter()
            .skip((page as usize - 1) * PAGE_SIZE)
            .take(PAGE_SIZE)
            .collect())
    }

    async fn search_code(
        &self,
        project_id: u64,
        keyword: &str,
        credential: &Credential,
        git_ref: Option<&str>,
    ) -> Result<Vec<SearchHit>> {
        self.record(Call::SearchCode {
            project_id,
            keyword: keyword.to_string(),
            token: credential.expose().to_string(),
            git_ref: git_ref.map(str::to_string),
        });

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        let (latency, failing, panicking, hits) = {
            let script = self.script();
            (
                script.search_latency,
                script.failing_projects.contains(&project_id),
                script.panicking_projects.contains(&project_id),
                script.hits.get(&project_id).cloned().unwrap_or_default(),
            )
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if panicking {
            panic!("search of project {} panicked", project_id);
        }
        if failing {
            return Err(Error::Transport("connection reset by peer".to_string()));
        }
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_fixture() {
        let p = TestFixtures::project(10, 1, "team-a");
        assert_eq!(p.namespace.id, 1);
        assert_eq!(p.path_with_namespace, "team-a/project-10");
    }

    #[tokio::test]
    async fn test_mock_paginates_projects() {
        let projects: Vec<Project> = (0..150).map(|i| TestFixtures::project(i, 1, "g")).collect();
        let client = MockDirectoryClient::new().with_projects(1, projects);
        let cred = Credential::new("t");
        assert_eq!(client.list_projects(1, &cred, 1).await.unwrap().len(), 100);
        assert_eq!(client.list_projects(1, &cred, 2).await.unwrap().len(), 50);
        assert!(client.list_projects(1, &cred, 3).await.unwrap().is_empty());
    }
}
