pub mod default;
pub mod exporter;
pub mod models;

use crate::credential::Credential;
use crate::model::{Group, Project};
use crate::search::{RunProgress, SearchRun};
use crate::settings::Settings;
use crate::Result;
use async_trait::async_trait;
use tokio::sync::watch;

pub use default::DefaultSearchService;
pub use exporter::StatsExporter;
pub use models::*;

#[async_trait]
pub trait SearchService: Send + Sync {
    /// Groups visible to the active credential, from cache unless `refresh`
    async fn groups(&self, refresh: bool) -> Result<Vec<Group>>;

    /// Projects of every visible group, from cache unless `refresh`
    async fn projects(&self, refresh: bool) -> Result<Vec<Project>>;

    /// Start a search run and return its initial state while units run in the background
    async fn start_search(&self, request: SearchRequest) -> Result<SearchRun>;

    /// Run a search to completion
    async fn search(&self, request: SearchRequest) -> Result<SearchRun>;

    /// State of the current or most recent run
    fn current_run(&self) -> SearchRun;

    /// Progress notifications for every run
    fn progress_updates(&self) -> watch::Receiver<RunProgress>;

    async fn settings(&self) -> Result<Settings>;

    /// Validate and persist new settings
    async fn update_settings(&self, settings: Settings) -> Result<Settings>;

    /// Switch credentials; returns how many cache entries of other credentials were evicted
    async fn set_credential(&self, credential: Credential) -> Result<usize>;

    fn has_credential(&self) -> bool;

    /// Drop every cached inventory
    async fn clear_cache(&self) -> Result<()>;
}
