use crate::models::{
    CredentialRequest, CredentialResponse, FilterParams, GroupsResponse, ProjectsResponse,
    RefreshParams, RunSummary, StatsResponse,
};
use axum::{
    extract::Query,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use codescout_core::results::{filter_or_all, project_stats};
use codescout_core::service::{ResultPage, ResultQuery, SearchRequest, SearchService, StatsExporter};
use codescout_core::{Credential, Error, Settings};
use std::sync::Arc;
use tracing::warn;

pub struct AppState {
    pub service: Arc<dyn SearchService>,
}

pub type SharedState = Arc<AppState>;

type ApiError = (StatusCode, String);

/// Map a service error onto an HTTP status.
pub fn error_status(error: &Error) -> StatusCode {
    match error {
        Error::Validation(_) | Error::Filter(_) | Error::Config(_) => StatusCode::BAD_REQUEST,
        Error::Remote { .. } | Error::Transport(_) | Error::Payload(_) => StatusCode::BAD_GATEWAY,
        Error::PaginationLimit { .. } => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn api_error(error: Error) -> ApiError {
    let status = error_status(&error);
    if status.is_server_error() {
        warn!("Request failed: {}", error);
    }
    (status, error.to_string())
}

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn groups(
    Extension(state): Extension<SharedState>,
    Query(params): Query<RefreshParams>,
) -> Result<Json<GroupsResponse>, ApiError> {
    let groups = state.service.groups(params.refresh).await.map_err(api_error)?;
    Ok(Json(GroupsResponse { groups }))
}

pub async fn projects(
    Extension(state): Extension<SharedState>,
    Query(params): Query<RefreshParams>,
) -> Result<Json<ProjectsResponse>, ApiError> {
    let projects = state
        .service
        .projects(params.refresh)
        .await
        .map_err(api_error)?;
    Ok(Json(ProjectsResponse { projects }))
}

/// Start a run in the background and return its initial state.
pub async fn start_search(
    Extension(state): Extension<SharedState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<RunSummary>, ApiError> {
    let run = state.service.start_search(req).await.map_err(api_error)?;
    Ok(Json(RunSummary::from(&run)))
}

pub async fn search_results(
    Extension(state): Extension<SharedState>,
    Query(query): Query<ResultQuery>,
) -> Json<ResultPage> {
    let run = state.service.current_run();
    Json(ResultPage::from_run(&run, &query))
}

pub async fn search_stats(
    Extension(state): Extension<SharedState>,
    Query(params): Query<FilterParams>,
) -> Json<StatsResponse> {
    let run = state.service.current_run();
    let (filtered, filter_error) = filter_or_all(
        &run.results,
        params.include.as_deref(),
        params.exclude.as_deref(),
    );
    Json(StatsResponse {
        projects: project_stats(filtered),
        filter_error,
    })
}

pub async fn export_stats(
    Extension(state): Extension<SharedState>,
    Query(params): Query<FilterParams>,
) -> Result<Response, ApiError> {
    let run = state.service.current_run();
    let (filtered, _) = filter_or_all(
        &run.results,
        params.include.as_deref(),
        params.exclude.as_deref(),
    );
    let csv = StatsExporter::to_csv(&project_stats(filtered)).map_err(api_error)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"codescout-stats.csv\"",
            ),
        ],
        csv,
    )
        .into_response())
}

pub async fn get_settings(
    Extension(state): Extension<SharedState>,
) -> Result<Json<Settings>, ApiError> {
    let settings = state.service.settings().await.map_err(api_error)?;
    Ok(Json(settings))
}

pub async fn put_settings(
    Extension(state): Extension<SharedState>,
    Json(settings): Json<Settings>,
) -> Result<Json<Settings>, ApiError> {
    let saved = state
        .service
        .update_settings(settings)
        .await
        .map_err(api_error)?;
    Ok(Json(saved))
}

pub async fn put_credential(
    Extension(state): Extension<SharedState>,
    Json(req): Json<CredentialRequest>,
) -> Result<Json<CredentialResponse>, ApiError> {
    let evicted = state
        .service
        .set_credential(Credential::new(req.token))
        .await
        .map_err(api_error)?;
    Ok(Json(CredentialResponse { evicted }))
}

pub async fn clear_cache(Extension(state): Extension<SharedState>) -> Result<StatusCode, ApiError> {
    state.service.clear_cache().await.map_err(api_error)?;
    Ok(StatusCode::NO_CONTENT)
}
