//! Inventory and search result types.
//!
//! These mirror the JSON objects returned by the remote service. Required
//! fields are declared without defaults so that malformed payload elements
//! fail to deserialize instead of carrying undefined values downstream.

use serde::{Deserialize, Serialize};

/// A node in the remote namespace hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: u64,
    pub full_path: String,
}

impl Group {
    pub fn new(id: u64, full_path: impl Into<String>) -> Self {
        Self {
            id,
            full_path: full_path.into(),
        }
    }
}

/// The group a project belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    pub id: u64,
    pub full_path: String,
}

/// A repository inside a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
    pub path_with_namespace: String,
    pub web_url: String,
    pub namespace: Namespace,
    /// Human-readable "Group / Project" label, when the service provides it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_with_namespace: Option<String>,
}

impl Project {
    /// Label used in statistics and exports.
    pub fn display_name(&self) -> &str {
        self.name_with_namespace
            .as_deref()
            .unwrap_or(&self.path_with_namespace)
    }
}

/// A raw blob match as returned by a project code search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// File path within the project
    pub path: String,
    /// Branch or tag the match was found on
    #[serde(rename = "ref")]
    pub git_ref: String,
    /// Multi-line snippet containing the match
    pub data: String,
    /// 1-based line number of the snippet's first line
    pub startline: u64,
}

/// A search match enriched with its project and derived attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeMatch {
    pub project_id: u64,
    pub project_name: String,
    pub project_path: String,
    pub project_web_url: String,
    pub path: String,
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub snippet: String,
    pub start_line: u64,
    pub line_count: usize,
    /// `<project path>/blob/<ref>/<file path>`
    pub display_path: String,
}

impl CodeMatch {
    /// Attach a raw hit to the project it was found in.
    pub fn from_hit(project: &Project, hit: SearchHit) -> Self {
        let display_path = format!(
            "{}/blob/{}/{}",
            project.path_with_namespace, hit.git_ref, hit.path
        );
        Self {
            project_id: project.id,
            project_name: project.display_name().to_string(),
            project_path: project.path_with_namespace.clone(),
            project_web_url: project.web_url.clone(),
            line_count: hit.data.lines().count(),
            path: hit.path,
            git_ref: hit.git_ref,
            snippet: hit.data,
            start_line: hit.startline,
            display_path,
        }
    }

    /// Browser link to the first snippet line.
    pub fn file_link(&self) -> String {
        format!(
            "{}/-/blob/{}/{}#L{}",
            self.project_web_url, self.git_ref, self.path, self.start_line
        )
    }

    /// Snippet lines paired with their 1-based line numbers.
    pub fn numbered_lines(&self) -> impl Iterator<Item = (u64, &str)> {
        self.snippet
            .lines()
            .enumerate()
            .map(move |(i, line)| (self.start_line + i as u64, line))
    }
}
