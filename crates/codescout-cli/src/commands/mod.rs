//! Subcommand implementations.

pub mod cache;
pub mod groups;
pub mod login;
pub mod projects;
pub mod search;
pub mod settings;

use anyhow::Result;
use clap::Subcommand;
use codescout_core::service::DefaultSearchService;
use codescout_core::settings::{load_base_url, load_credential, DEFAULT_BASE_URL};
use codescout_core::storage::SqliteStorage;
use codescout_core::Credential;
use codescout_gitlab::GitlabClient;
use std::path::PathBuf;
use std::sync::Arc;

pub type Service = DefaultSearchService<GitlabClient, SqliteStorage>;

/// Flags shared by every subcommand.
pub struct GlobalArgs {
    pub database: PathBuf,
    pub base_url: Option<String>,
    pub token: Option<String>,
}

#[derive(Subcommand)]
pub enum CacheAction {
    /// Remove cached data of every token except the active one
    Evict,
    /// Remove all cached data
    Clear,
}

/// Storage and service wired from the global flags.
pub struct Context {
    pub storage: Arc<SqliteStorage>,
    pub service: Service,
    pub base_url: String,
}

impl Context {
    /// Open the database and build the service.
    ///
    /// The token and base URL come from the flags (or their environment
    /// variables), then from what was saved, then from defaults.
    pub async fn open(args: &GlobalArgs) -> Result<Self> {
        if let Some(parent) = args.database.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let storage = Arc::new(SqliteStorage::new(&args.database)?);

        let credential = match args.token.as_deref() {
            Some(token) if !token.trim().is_empty() => Credential::new(token),
            _ => load_credential(&*storage).await?,
        };
        let base_url = resolve_base_url(args.base_url.clone(), load_base_url(&*storage).await?);

        let client = Arc::new(GitlabClient::new(&base_url)?);
        let service = DefaultSearchService::new(client, Arc::clone(&storage), credential);

        Ok(Self {
            storage,
            service,
            base_url,
        })
    }
}

fn resolve_base_url(flag: Option<String>, saved: Option<String>) -> String {
    flag.filter(|u| !u.trim().is_empty())
        .or(saved)
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
}
