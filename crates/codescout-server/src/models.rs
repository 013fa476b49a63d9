use codescout_core::results::ProjectStats;
use codescout_core::{Group, Project, RunProgress, SearchRun};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct RefreshParams {
    #[serde(default)]
    pub refresh: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct FilterParams {
    pub include: Option<String>,
    pub exclude: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GroupsResponse {
    pub groups: Vec<Group>,
}

#[derive(Debug, Serialize)]
pub struct ProjectsResponse {
    pub projects: Vec<Project>,
}

/// A run's state without its matches.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    #[serde(flatten)]
    pub progress: RunProgress,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
}

impl From<&SearchRun> for RunSummary {
    fn from(run: &SearchRun) -> Self {
        Self {
            progress: run.progress(),
            started_at: run.started_at.map(|t| t.to_rfc3339()),
            finished_at: run.finished_at.map(|t| t.to_rfc3339()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub projects: Vec<ProjectStats>,
    pub filter_error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CredentialRequest {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct CredentialResponse {
    /// Cache entries of other tokens that were removed
    pub evicted: usize,
}
