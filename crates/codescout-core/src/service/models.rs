use crate::model::CodeMatch;
use crate::query::{GroupFilter, SearchParameters};
use crate::results::{filter_or_all, paginate, MSG_FILTER_FAILED};
use crate::search::{RunProgress, SearchRun};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Keyword, optionally with `ref:`, `group:` and `group_id:` filters
    pub query: String,
    #[serde(default, rename = "ref")]
    pub git_ref: Option<String>,
    #[serde(default)]
    pub group_ids: Vec<u64>,
    #[serde(default)]
    pub group_path: Option<String>,
    /// Send `query` as the keyword without looking for inline filters
    #[serde(default)]
    pub raw: bool,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn literal(query: impl Into<String>) -> Self {
        Self {
            raw: true,
            ..Self::new(query)
        }
    }

    /// Parse the query, letting explicit fields override inline filters.
    pub fn to_parameters(&self) -> SearchParameters {
        let mut params = if self.raw {
            SearchParameters::new(self.query.clone())
        } else {
            SearchParameters::parse(&self.query)
        };
        if let Some(git_ref) = &self.git_ref {
            params = params.with_ref(git_ref.clone());
        }
        let explicit = GroupFilter::from_parts(self.group_ids.clone(), self.group_path.clone());
        if explicit.is_set() {
            params.group_filter = explicit;
        }
        params
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultQuery {
    pub include: Option<String>,
    pub exclude: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

/// A filtered page of the current run's matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultPage {
    pub progress: RunProgress,
    /// Matches collected so far
    pub total_results: usize,
    /// Matches left after filtering
    pub filtered_results: usize,
    pub page: usize,
    pub page_size: usize,
    pub items: Vec<CodeMatch>,
    pub filter_error: Option<String>,
}

impl ResultPage {
    pub fn from_run(run: &SearchRun, query: &ResultQuery) -> Self {
        let (filtered, filter_error) = filter_or_all(
            &run.results,
            query.include.as_deref(),
            query.exclude.as_deref(),
        );
        let page = query.page.unwrap_or(1).max(1);
        let page_size = query.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
        let items = paginate(&filtered, page, page_size)
            .iter()
            .map(|m| (*m).clone())
            .collect();

        let mut progress = run.progress();
        if filter_error.is_some() {
            progress.message = MSG_FILTER_FAILED.to_string();
        }

        Self {
            progress,
            total_results: run.results.len(),
            filtered_results: filtered.len(),
            page,
            page_size,
            items,
            filter_error,
        }
    }
}
