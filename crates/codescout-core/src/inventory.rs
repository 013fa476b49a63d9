//! Group and project inventory resolution.
//!
//! Inventories are read from the credential cache when present and
//! non-empty, and otherwise fetched from the remote service page by page.
//! Project listings fan out across groups through a [`WorkPool`].

use crate::cache::{CredentialCache, GROUPS_KEY, PROJECTS_KEY};
use crate::credential::Credential;
use crate::error::{Error, Result};
use crate::model::{Group, Project};
use crate::pool::WorkPool;
use crate::remote::{DirectoryClient, MAX_PAGES, PAGE_SIZE};
use crate::settings::Throttle;
use crate::storage::CacheStore;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// The resolved groups and projects of a credential.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Inventory {
    pub groups: Vec<Group>,
    pub projects: Vec<Project>,
}

/// Resolves inventories, preferring the cache.
pub struct InventoryBuilder<C: ?Sized, S: ?Sized> {
    client: Arc<C>,
    cache: CredentialCache<S>,
    initialized: AtomicBool,
}

impl<C, S> InventoryBuilder<C, S>
where
    C: DirectoryClient + ?Sized,
    S: CacheStore + ?Sized,
{
    pub fn new(client: Arc<C>, cache: CredentialCache<S>) -> Self {
        Self {
            client,
            cache,
            initialized: AtomicBool::new(false),
        }
    }

    /// Whether a project inventory has been loaded or fetched.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Groups from the cache, or from the remote service on a miss.
    pub async fn resolve_groups(&self, credential: &Credential) -> Result<Vec<Group>> {
        require_credential(credential)?;
        if let Some(groups) = self.cached::<Group>(GROUPS_KEY, credential).await? {
            debug!("Using {} cached groups", groups.len());
            return Ok(groups);
        }
        self.refresh_groups_remote(credential).await
    }

    /// Fetch every group page, bypassing the cache, and cache the result.
    pub async fn refresh_groups_remote(&self, credential: &Credential) -> Result<Vec<Group>> {
        require_credential(credential)?;
        let groups = collect_pages("groups", |page| {
            self.client.list_groups(credential, page)
        })
        .await?;

        if !groups.is_empty() {
            self.cache.set(GROUPS_KEY, credential, &groups).await?;
        }
        info!("Fetched {} groups", groups.len());
        Ok(groups)
    }

    /// Projects from the cache, or fetched for `groups` on a miss.
    pub async fn resolve_projects(
        &self,
        groups: &[Group],
        credential: &Credential,
        throttle: Throttle,
    ) -> Result<Vec<Project>> {
        require_credential(credential)?;
        if let Some(projects) = self.cached::<Project>(PROJECTS_KEY, credential).await? {
            debug!("Using {} cached projects", projects.len());
            self.initialized.store(true, Ordering::SeqCst);
            return Ok(projects);
        }
        self.refresh_projects_remote(groups, credential, throttle).await
    }

    /// Fetch the projects of every group, bypassing the cache.
    ///
    /// A group whose listing fails contributes no projects. The combined
    /// result is cached even when some groups failed.
    pub async fn refresh_projects_remote(
        &self,
        groups: &[Group],
        credential: &Credential,
        throttle: Throttle,
    ) -> Result<Vec<Project>> {
        require_credential(credential)?;
        let pool = WorkPool::from_throttle(throttle);

        let outcomes = join_all(
            groups
                .iter()
                .map(|group| pool.run(self.group_projects(group, credential))),
        )
        .await;

        let mut projects = Vec::new();
        let mut failed = 0;
        for (group, outcome) in groups.iter().zip(outcomes) {
            match outcome.and_then(|listing| listing) {
                Ok(found) => projects.extend(found),
                Err(e) => {
                    if e.is_isolated() {
                        warn!("Failed to list projects of group {}: {}", group.full_path, e);
                    } else {
                        error!("Listing projects of group {} aborted: {}", group.full_path, e);
                    }
                    failed += 1;
                }
            }
        }

        self.cache.set(PROJECTS_KEY, credential, &projects).await?;
        self.initialized.store(true, Ordering::SeqCst);
        info!(
            "Fetched {} projects from {} groups ({} failed)",
            projects.len(),
            groups.len(),
            failed
        );
        Ok(projects)
    }

    /// Resolve groups, then the projects of those groups.
    pub async fn resolve(&self, credential: &Credential, throttle: Throttle) -> Result<Inventory> {
        let groups = self.resolve_groups(credential).await?;
        let projects = self.resolve_projects(&groups, credential, throttle).await?;
        Ok(Inventory { groups, projects })
    }

    async fn group_projects(&self, group: &Group, credential: &Credential) -> Result<Vec<Project>> {
        let operation = format!("projects of group {}", group.id);
        collect_pages(&operation, |page| {
            self.client.list_projects(group.id, credential, page)
        })
        .await
    }

    /// A cached list, where an empty list counts as a miss.
    async fn cached<T>(&self, key: &str, credential: &Credential) -> Result<Option<Vec<T>>>
    where
        T: serde::de::DeserializeOwned,
    {
        let cached: Option<Vec<T>> = self.cache.get(key, credential).await?;
        Ok(cached.filter(|items| !items.is_empty()))
    }
}

fn require_credential(credential: &Credential) -> Result<()> {
    if credential.is_empty() {
        return Err(Error::Validation("an access token is required".to_string()));
    }
    Ok(())
}

/// Fetch pages starting at 1 until a short page arrives.
async fn collect_pages<T, F, Fut>(operation: &str, mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    let mut all = Vec::new();
    for page in 1..=MAX_PAGES {
        let batch = fetch(page).await?;
        let full = batch.len() == PAGE_SIZE;
        all.extend(batch);
        if !full {
            return Ok(all);
        }
    }
    Err(Error::PaginationLimit {
        operation: operation.to_string(),
        pages: MAX_PAGES,
    })
}
