use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::info;

use crate::cache::CredentialCache;
use crate::credential::Credential;
use crate::inventory::InventoryBuilder;
use crate::model::{Group, Project};
use crate::remote::DirectoryClient;
use crate::search::{RunHandle, RunProgress, SearchOrchestrator, SearchRun};
use crate::service::{SearchRequest, SearchService};
use crate::settings::{self, Settings};
use crate::storage::{CacheStore, SettingsStore};
use crate::{Error, Result};

/// Composes inventory resolution, the orchestrator, the cache and settings
/// around one active credential.
pub struct DefaultSearchService<C: ?Sized, S: ?Sized> {
    store: Arc<S>,
    cache: CredentialCache<S>,
    inventory: InventoryBuilder<C, S>,
    orchestrator: SearchOrchestrator<C>,
    credential: RwLock<Credential>,
}

impl<C, S> DefaultSearchService<C, S>
where
    C: DirectoryClient + ?Sized + 'static,
    S: CacheStore + SettingsStore + ?Sized,
{
    pub fn new(client: Arc<C>, store: Arc<S>, credential: Credential) -> Self {
        let cache = CredentialCache::new(Arc::clone(&store));
        Self {
            inventory: InventoryBuilder::new(Arc::clone(&client), cache.clone()),
            orchestrator: SearchOrchestrator::new(client),
            cache,
            store,
            credential: RwLock::new(credential),
        }
    }

    pub fn credential(&self) -> Credential {
        self.credential
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn inventory_initialized(&self) -> bool {
        self.inventory.is_initialized()
    }

    async fn begin(&self, request: &SearchRequest) -> Result<RunHandle> {
        let credential = self.credential();
        let params = request.to_parameters();
        // No inventory traffic for a search that cannot run
        self.orchestrator.check_preconditions(&credential, &params)?;

        let settings = Settings::load(&*self.store).await?;
        let inventory = self.inventory.resolve(&credential, settings.inventory).await?;
        self.orchestrator
            .start(&credential, &params, &inventory.projects, settings.search)
    }
}

#[async_trait]
impl<C, S> SearchService for DefaultSearchService<C, S>
where
    C: DirectoryClient + ?Sized + 'static,
    S: CacheStore + SettingsStore + ?Sized,
{
    async fn groups(&self, refresh: bool) -> Result<Vec<Group>> {
        let credential = self.credential();
        if refresh {
            self.inventory.refresh_groups_remote(&credential).await
        } else {
            self.inventory.resolve_groups(&credential).await
        }
    }

    async fn projects(&self, refresh: bool) -> Result<Vec<Project>> {
        let credential = self.credential();
        let settings = Settings::load(&*self.store).await?;
        let groups = self.inventory.resolve_groups(&credential).await?;
        if refresh {
            self.inventory
                .refresh_projects_remote(&groups, &credential, settings.inventory)
                .await
        } else {
            self.inventory
                .resolve_projects(&groups, &credential, settings.inventory)
                .await
        }
    }

    async fn start_search(&self, request: SearchRequest) -> Result<SearchRun> {
        self.begin(&request).await?;
        Ok(self.orchestrator.snapshot())
    }

    async fn search(&self, request: SearchRequest) -> Result<SearchRun> {
        self.begin(&request).await?.wait().await
    }

    fn current_run(&self) -> SearchRun {
        self.orchestrator.snapshot()
    }

    fn progress_updates(&self) -> watch::Receiver<RunProgress> {
        self.orchestrator.subscribe()
    }

    async fn settings(&self) -> Result<Settings> {
        Settings::load(&*self.store).await
    }

    async fn update_settings(&self, settings: Settings) -> Result<Settings> {
        settings.save(&*self.store).await?;
        info!("Settings saved: {:?}", settings);
        Ok(settings)
    }

    async fn set_credential(&self, credential: Credential) -> Result<usize> {
        if credential.is_empty() {
            return Err(Error::Validation("an access token is required".to_string()));
        }
        settings::save_credential(&*self.store, &credential).await?;
        let evicted = self.cache.evict_foreign(&credential).await?;
        info!("Switched to {:?}", credential);
        *self
            .credential
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = credential;
        Ok(evicted)
    }

    fn has_credential(&self) -> bool {
        !self.credential().is_empty()
    }

    async fn clear_cache(&self) -> Result<()> {
        self.cache.clear_all().await
    }
}
