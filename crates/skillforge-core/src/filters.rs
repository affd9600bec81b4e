//! Query-time filters shared by the Vector Store and the hybrid search
//! engine (spec.md §4.4, §4.6): conjunctive equality/membership predicates
//! plus the tag hints that double as the graph phase's `tag_boost` input.

use std::collections::BTreeSet;

use crate::category::Category;
use crate::ids::RepoId;

/// Conjunctive filter applied at query time. An empty filter matches
/// everything. `tags` serves two purposes: the Vector Store applies it as
/// an anchored substring membership predicate (spec.md §4.4), and the
/// hybrid search engine reuses it as the `query_tags` set for the graph
/// phase's `tag_boost` (spec.md §4.6) when explicit tag hints are given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilters {
    pub category: Option<Category>,
    pub repo_ids: BTreeSet<RepoId>,
    pub tags: BTreeSet<String>,
}

impl SearchFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.repo_ids.is_empty() && self.tags.is_empty()
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_repo_id(mut self, id: RepoId) -> Self {
        self.repo_ids.insert(id);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_is_empty() {
        assert!(SearchFilters::new().is_empty());
    }

    #[test]
    fn any_field_makes_it_non_empty() {
        assert!(!SearchFilters::new().with_category(Category::Testing).is_empty());
        assert!(!SearchFilters::new().with_repo_id(RepoId::from_raw("r")).is_empty());
        assert!(!SearchFilters::new().with_tag("tdd").is_empty());
    }
}
