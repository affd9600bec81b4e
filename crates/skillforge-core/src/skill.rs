//! The central [`Skill`] entity.

use std::collections::BTreeSet;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::ids::{RepoId, SkillId};

/// A validated unit of advisory content with structured metadata and a
/// markdown body.
///
/// Invariants enforced by the parser before a `Skill` is ever constructed:
/// `description.len() >= 10`, `instructions.len() >= 50`, `!name.is_empty()`.
/// `tags` and `dependencies` are sets, never allowing duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub id: SkillId,
    pub name: String,
    pub description: String,
    /// Full markdown body (the "instructions").
    pub instructions: String,
    pub category: Category,
    pub tags: BTreeSet<String>,
    pub dependencies: BTreeSet<SkillId>,
    pub examples: Vec<String>,
    pub file_path: PathBuf,
    pub repo_id: RepoId,
    pub version: Option<String>,
    pub author: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Skill {
    /// The fixed-order, fixed-separator text fed to the embedder, per
    /// spec: name, description, category, space-joined tags, and the
    /// first 1,000 characters of instructions, newline-separated.
    pub fn embeddable_text(&self) -> String {
        let tags_joined = self.tags.iter().cloned().collect::<Vec<_>>().join(" ");
        let clipped_instructions: String = self.instructions.chars().take(1_000).collect();
        [
            self.name.as_str(),
            self.description.as_str(),
            self.category.as_str(),
            tags_joined.as_str(),
            clipped_instructions.as_str(),
        ]
        .join("\n")
    }

    /// Tags rendered as a comma-delimited string for vector-store metadata
    /// filters that forbid array-valued fields.
    pub fn tags_delimited(&self) -> String {
        self.tags.iter().cloned().collect::<Vec<_>>().join(",")
    }

    /// Parse a comma-delimited tag string back into a set, the inverse of
    /// [`Skill::tags_delimited`].
    pub fn parse_tags_delimited(value: &str) -> BTreeSet<String> {
        value
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_skill() -> Skill {
        Skill {
            id: SkillId::from_raw("repo/testing/tdd"),
            name: "test-driven-development".into(),
            description: "TDD patterns and practices.".into(),
            instructions: "x".repeat(200),
            category: Category::Testing,
            tags: ["testing", "tdd"].into_iter().map(String::from).collect(),
            dependencies: BTreeSet::new(),
            examples: vec![],
            file_path: PathBuf::from("/repo/testing/tdd/SKILL.md"),
            repo_id: RepoId::from_raw("repo"),
            version: None,
            author: None,
            updated_at: None,
        }
    }

    #[test]
    fn embeddable_text_clips_instructions_to_1000_chars() {
        let mut skill = sample_skill();
        skill.instructions = "y".repeat(5_000);
        let text = skill.embeddable_text();
        // name + \n + description + \n + category + \n + tags + \n + 1000 chars
        let instructions_part = text.rsplit('\n').next().unwrap();
        assert_eq!(instructions_part.len(), 1_000);
    }

    #[test]
    fn embeddable_text_field_order_is_fixed() {
        let skill = sample_skill();
        let text = skill.embeddable_text();
        let lines: Vec<&str> = text.split('\n').collect();
        assert_eq!(lines[0], "test-driven-development");
        assert_eq!(lines[1], "TDD patterns and practices.");
        assert_eq!(lines[2], "testing");
        assert_eq!(lines[3], "tdd testing");
    }

    #[test]
    fn tag_delimited_round_trips() {
        let skill = sample_skill();
        let delimited = skill.tags_delimited();
        let parsed = Skill::parse_tags_delimited(&delimited);
        assert_eq!(parsed, skill.tags);
    }

    #[test]
    fn empty_tag_string_round_trips_to_empty_set() {
        let parsed = Skill::parse_tags_delimited("");
        assert!(parsed.is_empty());
    }
}
