use crate::handlers::{
    clear_cache, export_stats, get_settings, groups, health, projects, put_credential,
    put_settings, search_results, search_stats, start_search, AppState, SharedState,
};
use anyhow::Result;
use axum::{
    routing::{delete, get, put},
    Extension, Router,
};
use codescout_core::service::{DefaultSearchService, SearchService};
use codescout_core::settings::{load_base_url, load_credential, DEFAULT_BASE_URL};
use codescout_core::storage::SqliteStorage;
use codescout_core::Credential;
use codescout_gitlab::GitlabClient;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the API router around a service.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/groups", get(groups))
        .route("/api/v1/projects", get(projects))
        .route("/api/v1/search", get(search_results).post(start_search))
        .route("/api/v1/search/stats", get(search_stats))
        .route("/api/v1/search/export", get(export_stats))
        .route("/api/v1/settings", get(get_settings).put(put_settings))
        .route("/api/v1/credential", put(put_credential))
        .route("/api/v1/cache", delete(clear_cache))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(Extension(state))
}

pub async fn start(
    db_path: PathBuf,
    port: u16,
    base_url: Option<String>,
    token: Option<String>,
) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let storage = Arc::new(SqliteStorage::new(&db_path)?);

    let credential = match token {
        Some(token) if !token.trim().is_empty() => Credential::new(token),
        _ => load_credential(&*storage).await?,
    };
    let base_url = match base_url {
        Some(url) if !url.trim().is_empty() => url,
        _ => load_base_url(&*storage)
            .await?
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
    };

    let client = Arc::new(GitlabClient::new(&base_url)?);
    let service =
        Arc::new(DefaultSearchService::new(client, storage, credential)) as Arc<dyn SearchService>;
    if !service.has_credential() {
        info!("No token configured; set one with PUT /api/v1/credential");
    }

    let state = Arc::new(AppState { service });
    let app = router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!("Using GitLab instance {}", base_url);
    println!("CodeScout server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
