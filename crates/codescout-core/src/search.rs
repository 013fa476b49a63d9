//! Multi-project search orchestration.
//!
//! A run fans one search unit out per selected project. Units share a
//! [`WorkPool`], publish their matches into the orchestrator's run state as
//! they complete, and never fail the run: a unit whose search errors is
//! logged and counted like any other.
//!
//! Every run gets a new generation number. Units from a superseded run keep
//! running to completion but their publications are dropped, so they cannot
//! leak matches or progress into the run that replaced them.

use crate::credential::Credential;
use crate::error::{Error, Result};
use crate::model::{CodeMatch, Project, SearchHit};
use crate::pool::WorkPool;
use crate::query::SearchParameters;
use crate::remote::DirectoryClient;
use crate::settings::Throttle;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

pub const MSG_MISSING_INPUT: &str = "Enter an access token and a keyword";
pub const MSG_SEARCHING: &str = "Searching...";
pub const MSG_NO_PROJECTS: &str = "No matching projects";
pub const MSG_COMPLETE: &str = "Search complete";

/// Lifecycle of a search run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Idle => "idle",
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }
}

/// State of the current (or most recent) run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRun {
    pub generation: u64,
    pub status: RunStatus,
    pub projects_total: usize,
    pub projects_searched: usize,
    /// Matches in completion order
    pub results: Vec<CodeMatch>,
    pub message: String,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl SearchRun {
    pub fn progress(&self) -> RunProgress {
        RunProgress {
            generation: self.generation,
            status: self.status,
            projects_searched: self.projects_searched,
            projects_total: self.projects_total,
            result_count: self.results.len(),
            message: self.message.clone(),
        }
    }
}

/// Lightweight view of a run, broadcast on every change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunProgress {
    pub generation: u64,
    pub status: RunStatus,
    pub projects_searched: usize,
    pub projects_total: usize,
    pub result_count: usize,
    pub message: String,
}

struct Shared {
    run: Mutex<SearchRun>,
    progress: watch::Sender<RunProgress>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SearchRun> {
        self.run.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn announce(&self, run: &SearchRun) {
        self.progress.send_replace(run.progress());
    }

    /// Record one unit's outcome, unless its run has been superseded.
    fn publish(&self, generation: u64, project: &Project, outcome: Result<Vec<SearchHit>>) {
        let mut run = self.lock();
        if run.generation != generation {
            debug!(
                "Dropping result of superseded run {} for project {}",
                generation, project.path_with_namespace
            );
            return;
        }
        match outcome {
            Ok(hits) => {
                if !hits.is_empty() {
                    debug!("{} matches in {}", hits.len(), project.path_with_namespace);
                }
                run.results
                    .extend(hits.into_iter().map(|hit| CodeMatch::from_hit(project, hit)));
            }
            Err(e) if e.is_isolated() => warn!(
                "Failed to search in project {}: {}",
                project.path_with_namespace, e
            ),
            Err(e) => error!(
                "Search of project {} aborted: {}",
                project.path_with_namespace, e
            ),
        }
        run.projects_searched += 1;
        self.announce(&run);
    }

    /// Apply the terminal transition of a run whose units have all ended.
    fn finish(&self, generation: u64) {
        let mut run = self.lock();
        if run.generation != generation {
            return;
        }
        if run.projects_searched == run.projects_total {
            run.status = RunStatus::Completed;
            run.message = MSG_COMPLETE.to_string();
        } else {
            run.status = RunStatus::Failed;
            run.message = format!(
                "Search ended early: {} of {} projects did not report",
                run.projects_total - run.projects_searched,
                run.projects_total
            );
        }
        run.finished_at = Some(Utc::now());
        info!(
            "Search run {} {}: {}/{} projects, {} matches",
            generation,
            run.status.as_str(),
            run.projects_searched,
            run.projects_total,
            run.results.len()
        );
        self.announce(&run);
    }
}

/// Handle to a started run.
pub struct RunHandle {
    generation: u64,
    driver: Option<JoinHandle<()>>,
    shared: Arc<Shared>,
}

impl RunHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Wait for every unit of this run to end.
    ///
    /// Returns the orchestrator's state at that point. If a newer run has
    /// started meanwhile, the returned state belongs to it; compare
    /// `generation` to tell.
    pub async fn wait(self) -> Result<SearchRun> {
        if let Some(driver) = self.driver {
            driver
                .await
                .map_err(|e| Error::Other(anyhow::anyhow!("Search driver failed: {}", e)))?;
        }
        Ok(self.shared.lock().clone())
    }
}

/// Dispatches per-project searches and tracks run state.
pub struct SearchOrchestrator<C: ?Sized> {
    client: Arc<C>,
    shared: Arc<Shared>,
}

impl<C> SearchOrchestrator<C>
where
    C: DirectoryClient + ?Sized + 'static,
{
    pub fn new(client: Arc<C>) -> Self {
        let (progress, _) = watch::channel(RunProgress::default());
        Self {
            client,
            shared: Arc::new(Shared {
                run: Mutex::new(SearchRun::default()),
                progress,
            }),
        }
    }

    /// Copy of the current run state.
    pub fn snapshot(&self) -> SearchRun {
        self.shared.lock().clone()
    }

    pub fn progress(&self) -> RunProgress {
        self.shared.lock().progress()
    }

    /// Receive a [`RunProgress`] after every state change.
    pub fn subscribe(&self) -> watch::Receiver<RunProgress> {
        self.shared.progress.subscribe()
    }

    /// Reject a run that lacks a credential or keyword.
    ///
    /// Only the status message changes; the run status is left as it was.
    pub fn check_preconditions(&self, credential: &Credential, params: &SearchParameters) -> Result<()> {
        if credential.is_empty() || params.keyword.trim().is_empty() {
            let mut run = self.shared.lock();
            run.message = MSG_MISSING_INPUT.to_string();
            self.shared.announce(&run);
            return Err(Error::Validation(MSG_MISSING_INPUT.to_string()));
        }
        Ok(())
    }

    /// Start a run and return without waiting for it.
    ///
    /// Fails with [`Error::Validation`] without touching the run state's
    /// status when the credential or keyword is empty. Any run already in
    /// progress is superseded.
    pub fn start(
        &self,
        credential: &Credential,
        params: &SearchParameters,
        inventory: &[Project],
        throttle: Throttle,
    ) -> Result<RunHandle> {
        self.check_preconditions(credential, params)?;

        let selected: Vec<Project> = params
            .group_filter
            .select(inventory)
            .into_iter()
            .cloned()
            .collect();

        let generation = {
            let mut run = self.shared.lock();
            let generation = run.generation + 1;
            *run = SearchRun {
                generation,
                status: RunStatus::Running,
                projects_total: selected.len(),
                message: MSG_SEARCHING.to_string(),
                started_at: Some(Utc::now()),
                ..Default::default()
            };
            if selected.is_empty() {
                run.status = RunStatus::Completed;
                run.message = MSG_NO_PROJECTS.to_string();
                run.finished_at = run.started_at;
            }
            self.shared.announce(&run);
            generation
        };

        if selected.is_empty() {
            info!("Search run {}: no matching projects", generation);
            return Ok(RunHandle {
                generation,
                driver: None,
                shared: Arc::clone(&self.shared),
            });
        }

        info!(
            "Search run {}: '{}' across {} projects (limit {}, delay {}ms)",
            generation,
            params.keyword,
            selected.len(),
            throttle.concurrency_limit,
            throttle.request_delay_ms
        );

        let pool = WorkPool::from_throttle(throttle);
        let mut units = JoinSet::new();
        for project in selected {
            let client = Arc::clone(&self.client);
            let shared = Arc::clone(&self.shared);
            let pool = pool.clone();
            let credential = credential.clone();
            let keyword = params.keyword.clone();
            let git_ref = params.git_ref.clone();

            units.spawn(async move {
                let unit = async {
                    let outcome = client
                        .search_code(project.id, &keyword, &credential, git_ref.as_deref())
                        .await;
                    shared.publish(generation, &project, outcome);
                };
                if let Err(e) = pool.run(unit).await {
                    warn!("Search unit for {} not run: {}", project.path_with_namespace, e);
                }
            });
        }

        let shared = Arc::clone(&self.shared);
        let driver = tokio::spawn(async move {
            while let Some(joined) = units.join_next().await {
                if let Err(e) = joined {
                    warn!("Search unit aborted: {}", e);
                }
            }
            shared.finish(generation);
        });

        Ok(RunHandle {
            generation,
            driver: Some(driver),
            shared: Arc::clone(&self.shared),
        })
    }

    /// Start a run and wait for it to finish.
    pub async fn run_search(
        &self,
        credential: &Credential,
        params: &SearchParameters,
        inventory: &[Project],
        throttle: Throttle,
    ) -> Result<SearchRun> {
        self.start(credential, params, inventory, throttle)?.wait().await
    }
}
