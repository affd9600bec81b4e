//! Pure scoring functions for the hybrid fusion algorithm (spec.md §4.6).
//! Kept free of any store access so the weighting and tie-breaking rules
//! are directly unit-testable.

use std::collections::BTreeSet;

use skillforge_core::{Category, ScoredSkill};

/// `Σ_{t ∈ query_tags} 1[skill has t] / max(1, |query_tags|)`, or `0` if
/// the caller supplied no tag hints.
pub fn tag_boost(skill_tags: &BTreeSet<String>, query_tags: &BTreeSet<String>) -> f32 {
    if query_tags.is_empty() {
        return 0.0;
    }
    let matched = query_tags.iter().filter(|t| skill_tags.contains(*t)).count();
    matched as f32 / query_tags.len().max(1) as f32
}

/// `1` if the caller filtered on a category and it matches, else `0`.
pub fn category_boost(skill_category: Category, filter_category: Option<Category>) -> f32 {
    match filter_category {
        Some(c) if c == skill_category => 1.0,
        _ => 0.0,
    }
}

/// Combines the three boost components into a single `graph_score`,
/// weighted by the configured boost constants and clamped to `[0, 1]`
/// (spec.md §4.6, step 2).
pub fn graph_score(
    tag_boost: f32,
    category_boost: f32,
    in_neighborhood: bool,
    tag_boost_weight: f32,
    category_boost_weight: f32,
    neighborhood_boost_weight: f32,
) -> f32 {
    let neighborhood_term = if in_neighborhood { neighborhood_boost_weight } else { 0.0 };
    (tag_boost * tag_boost_weight + category_boost * category_boost_weight + neighborhood_term).clamp(0.0, 1.0)
}

/// `vector_weight * sim_score + graph_weight * graph_score`.
pub fn fuse_score(sim_score: f32, graph_score: f32, vector_weight: f32, graph_weight: f32) -> f32 {
    (vector_weight * sim_score + graph_weight * graph_score).clamp(0.0, 1.0)
}

/// Sorts `hits` descending by `score`, ties broken by ascending
/// `skill.id` (spec.md §4.6, step 3), then truncates to `top_k`.
pub fn rank(mut hits: Vec<ScoredSkill>, top_k: usize) -> Vec<ScoredSkill> {
    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.skill.id.cmp(&b.skill.id))
    });
    hits.truncate(top_k);
    hits
}
