//! Client-side views over collected matches: glob filtering, pagination and
//! per-project statistics.

use crate::error::{Error, Result};
use crate::model::CodeMatch;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// Status shown when a filter pattern cannot be compiled.
pub const MSG_FILTER_FAILED: &str = "Filter failed";

/// Include/exclude glob filter over match display paths.
#[derive(Debug, Clone, Default)]
pub struct ResultFilter {
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl ResultFilter {
    /// Build a filter from comma-separated glob lists. Empty lists are ignored.
    pub fn new(include: Option<&str>, exclude: Option<&str>) -> Result<Self> {
        Ok(Self {
            include: compile(include)?,
            exclude: compile(exclude)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_none() && self.exclude.is_none()
    }

    pub fn matches(&self, item: &CodeMatch) -> bool {
        if let Some(include) = &self.include {
            if !include.is_match(&item.display_path) {
                return false;
            }
        }
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(&item.display_path) {
                return false;
            }
        }
        true
    }

    pub fn apply<'a>(&self, items: &'a [CodeMatch]) -> Vec<&'a CodeMatch> {
        items.iter().filter(|item| self.matches(item)).collect()
    }
}

fn compile(patterns: Option<&str>) -> Result<Option<GlobSet>> {
    let patterns: Vec<&str> = patterns
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| Error::Filter(e.to_string()))?;
        builder.add(glob);
    }
    let set = builder.build().map_err(|e| Error::Filter(e.to_string()))?;
    Ok(Some(set))
}

/// Filter matches, falling back to the unfiltered list if the patterns are
/// malformed. The error message is returned alongside in that case.
pub fn filter_or_all<'a>(
    items: &'a [CodeMatch],
    include: Option<&str>,
    exclude: Option<&str>,
) -> (Vec<&'a CodeMatch>, Option<String>) {
    match ResultFilter::new(include, exclude) {
        Ok(filter) => (filter.apply(items), None),
        Err(e) => {
            warn!("Error applying glob filter: {}", e);
            (items.iter().collect(), Some(e.to_string()))
        }
    }
}

/// One page (1-based) of a list. Out-of-range pages are empty.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

/// Matched files of one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectStats {
    /// 1-based position in first-appearance order
    pub index: usize,
    pub project_name: String,
    pub project_link: String,
    /// Display paths of every match in the project
    pub files: Vec<String>,
}

/// Group matches by project, in order of each project's first match.
pub fn project_stats<'a, I>(matches: I) -> Vec<ProjectStats>
where
    I: IntoIterator<Item = &'a CodeMatch>,
{
    let mut stats: Vec<ProjectStats> = Vec::new();
    let mut positions: HashMap<u64, usize> = HashMap::new();

    for item in matches {
        let position = *positions.entry(item.project_id).or_insert_with(|| {
            stats.push(ProjectStats {
                index: stats.len() + 1,
                project_name: item.project_name.clone(),
                project_link: item.project_web_url.clone(),
                files: Vec::new(),
            });
            stats.len() - 1
        });
        stats[position].files.push(item.display_path.clone());
    }
    stats
}
