//! Translates a [`SearchFilters`] into a LanceDB scalar filter predicate.
//!
//! Tags are stored as a comma-delimited string (spec.md §4.4: "some
//! embedded vector backends forbid array-valued metadata in filter
//! predicates"), so tag membership is a substring match anchored on
//! delimiters: wrap the stored value in commas and look for `,tag,`.

use skillforge_core::SearchFilters;

use crate::schema::{COL_CATEGORY, COL_REPO_ID, COL_TAGS};

/// Escapes single quotes for embedding into a SQL-style string literal.
fn escape(value: &str) -> String {
    value.replace('\'', "''")
}

pub fn build_predicate(filters: &SearchFilters) -> Option<String> {
    let mut clauses = Vec::new();

    if let Some(category) = &filters.category {
        clauses.push(format!("{COL_CATEGORY} = '{}'", escape(category.as_str())));
    }

    if !filters.repo_ids.is_empty() {
        let ids = filters
            .repo_ids
            .iter()
            .map(|id| format!("'{}'", escape(id.as_str())))
            .collect::<Vec<_>>()
            .join(", ");
        clauses.push(format!("{COL_REPO_ID} IN ({ids})"));
    }

    for tag in &filters.tags {
        clauses.push(format!("(',' || {COL_TAGS} || ',') LIKE '%,{},%'", escape(tag)));
    }

    if clauses.is_empty() {
        None
    } else {
        Some(clauses.join(" AND "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillforge_core::{Category, RepoId};

    #[test]
    fn empty_filters_produce_no_predicate() {
        assert_eq!(build_predicate(&SearchFilters::new()), None);
    }

    #[test]
    fn category_filter_is_equality() {
        let filters = SearchFilters::new().with_category(Category::Security);
        assert_eq!(build_predicate(&filters), Some("category = 'security'".to_string()));
    }

    #[test]
    fn repo_id_filter_is_membership() {
        let filters = SearchFilters::new().with_repo_id(RepoId::from_raw("abc"));
        assert_eq!(build_predicate(&filters), Some("repo_id IN ('abc')".to_string()));
    }

    #[test]
    fn tag_filter_is_anchored_substring() {
        let filters = SearchFilters::new().with_tag("tdd");
        assert_eq!(
            build_predicate(&filters),
            Some("(',' || tags || ',') LIKE '%,tdd,%'".to_string())
        );
    }

    #[test]
    fn quotes_are_escaped() {
        let filters = SearchFilters::new().with_tag("o'brien");
        let predicate = build_predicate(&filters).unwrap();
        assert!(predicate.contains("o''brien"));
    }

    #[test]
    fn clauses_are_conjunctive() {
        let filters = SearchFilters::new()
            .with_category(Category::Testing)
            .with_tag("tdd");
        let predicate = build_predicate(&filters).unwrap();
        assert!(predicate.contains(" AND "));
    }
}
