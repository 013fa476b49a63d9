//! Search parameters and the query DSL.

use crate::model::Project;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Restricts which projects a search run contacts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "lowercase")]
pub enum GroupFilter {
    /// Search every project in the inventory
    #[default]
    None,
    /// Keep projects whose namespace id is in the set
    Exact(BTreeSet<u64>),
    /// Keep projects whose namespace path contains the substring
    Fuzzy(String),
}

impl GroupFilter {
    /// Build a filter from the two presentation inputs; exact ids win.
    pub fn from_parts(group_ids: Vec<u64>, group_path: Option<String>) -> Self {
        if !group_ids.is_empty() {
            return GroupFilter::Exact(group_ids.into_iter().collect());
        }
        match group_path {
            Some(p) if !p.trim().is_empty() => GroupFilter::Fuzzy(p.trim().to_string()),
            _ => GroupFilter::None,
        }
    }

    /// Whether the filter constrains anything.
    pub fn is_set(&self) -> bool {
        match self {
            GroupFilter::None => false,
            GroupFilter::Exact(ids) => !ids.is_empty(),
            GroupFilter::Fuzzy(pattern) => !pattern.is_empty(),
        }
    }

    pub fn matches(&self, project: &Project) -> bool {
        match self {
            GroupFilter::None => true,
            GroupFilter::Exact(ids) => ids.is_empty() || ids.contains(&project.namespace.id),
            GroupFilter::Fuzzy(pattern) => project.namespace.full_path.contains(pattern.as_str()),
        }
    }

    /// Select the projects a run should search, preserving inventory order.
    pub fn select<'a>(&self, inventory: &'a [Project]) -> Vec<&'a Project> {
        if !self.is_set() {
            return inventory.iter().collect();
        }
        inventory.iter().filter(|p| self.matches(p)).collect()
    }
}

/// User-entered parameters of one search run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParameters {
    /// Text to search for (required, non-empty)
    pub keyword: String,
    /// Branch or tag; `None` searches each project's default branch
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
    #[serde(default)]
    pub group_filter: GroupFilter,
}

impl SearchParameters {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            ..Default::default()
        }
    }

    pub fn with_ref(mut self, git_ref: impl Into<String>) -> Self {
        let git_ref = git_ref.into();
        self.git_ref = if git_ref.trim().is_empty() {
            None
        } else {
            Some(git_ref)
        };
        self
    }

    pub fn with_group_filter(mut self, filter: GroupFilter) -> Self {
        self.group_filter = filter;
        self
    }

    /// Parse a query string with optional filters.
    ///
    /// Example: "parse_config ref:release group:team-a group_id:12"
    ///
    /// Input without recognised filter tokens is kept verbatim as the
    /// keyword. So is input made only of filter tokens, which searches for
    /// the text itself (`ref:main` in a YAML file, say).
    pub fn parse(input: &str) -> Self {
        let mut params = SearchParameters::default();
        let mut keyword_parts = Vec::new();
        let mut group_ids = Vec::new();
        let mut group_path = None;
        let mut consumed = false;

        for token in input.split_whitespace() {
            if let Some((key, value)) = token.split_once(':') {
                match key.to_lowercase().as_str() {
                    "ref" | "branch" if !value.is_empty() => {
                        params.git_ref = Some(value.to_string());
                        consumed = true;
                    }
                    "group" if !value.is_empty() => {
                        group_path = Some(value.to_string());
                        consumed = true;
                    }
                    "group_id" => match value.parse::<u64>() {
                        Ok(id) => {
                            group_ids.push(id);
                            consumed = true;
                        }
                        Err(_) => keyword_parts.push(token),
                    },
                    _ => keyword_parts.push(token), // Unknown prefix stays in the keyword
                }
            } else {
                keyword_parts.push(token);
            }
        }

        if !consumed || keyword_parts.is_empty() {
            return SearchParameters::new(input);
        }

        params.keyword = keyword_parts.join(" ");
        params.group_filter = GroupFilter::from_parts(group_ids, group_path);
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::TestFixtures;

    #[test]
    fn test_parse_simple_query() {
        let q = SearchParameters::parse("load_config timeout");
        assert_eq!(q.keyword, "load_config timeout");
        assert_eq!(q.git_ref, None);
        assert_eq!(q.group_filter, GroupFilter::None);
    }

    #[test]
    fn test_parse_with_filters() {
        let q = SearchParameters::parse("redis ref:release group:team-a");
        assert_eq!(q.keyword, "redis");
        assert_eq!(q.git_ref.as_deref(), Some("release"));
        assert_eq!(q.group_filter, GroupFilter::Fuzzy("team-a".to_string()));
    }

    #[test]
    fn test_parse_exact_wins_over_fuzzy() {
        let q = SearchParameters::parse("redis group:team-a group_id:3 group_id:7");
        assert_eq!(q.group_filter, GroupFilter::Exact([3, 7].into_iter().collect()));
    }

    #[test]
    fn test_parse_keeps_plain_keyword_verbatim() {
        assert_eq!(SearchParameters::parse("foo  bar").keyword, "foo  bar");
        assert_eq!(SearchParameters::parse("  indented").keyword, "  indented");
        assert_eq!(SearchParameters::parse("a\tb").keyword, "a\tb");
    }

    #[test]
    fn test_parse_filters_only_is_a_keyword() {
        let q = SearchParameters::parse("ref:main");
        assert_eq!(q.keyword, "ref:main");
        assert_eq!(q.git_ref, None);

        let q = SearchParameters::parse("group:team-a group_id:4");
        assert_eq!(q.keyword, "group:team-a group_id:4");
        assert_eq!(q.group_filter, GroupFilter::None);
    }

    #[test]
    fn test_parse_with_unsupported_filter() {
        let q = SearchParameters::parse("http://host unknown:value group_id:abc");
        assert_eq!(q.keyword, "http://host unknown:value group_id:abc");
        assert_eq!(q.group_filter, GroupFilter::None);
    }

    #[test]
    fn test_exact_filter_selects_by_namespace_id() {
        let projects = TestFixtures::projects(&[(10, 1, "a"), (11, 2, "b"), (12, 3, "c")]);
        let filter = GroupFilter::Exact([1, 2].into_iter().collect());
        let ids: Vec<u64> = filter.select(&projects).iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![10, 11]);
    }

    #[test]
    fn test_fuzzy_filter_selects_by_path() {
        let projects = TestFixtures::projects(&[
            (10, 1, "org/team-a"),
            (11, 2, "org/team-b"),
            (12, 3, "team-a/sub"),
        ]);
        let filter = GroupFilter::Fuzzy("team-a".to_string());
        let ids: Vec<u64> = filter.select(&projects).iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![10, 12]);
    }

    #[test]
    fn test_unset_filter_keeps_everything() {
        let projects = TestFixtures::projects(&[(10, 1, "a"), (11, 2, "b")]);
        assert_eq!(GroupFilter::None.select(&projects).len(), 2);
        assert_eq!(GroupFilter::Fuzzy(String::new()).select(&projects).len(), 2);
        assert!(!GroupFilter::from_parts(vec![], Some("  ".into())).is_set());
    }
}
