//! Deserializes the YAML frontmatter block and resolves the two accepted
//! shapes (flat, and the external compatibility shape with a nested
//! `metadata:` object) into one typed, flat record.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer};

use crate::error::ParseWarning;

#[derive(Debug, Deserialize, Default)]
pub(crate) struct RawFrontMatter {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    #[serde(default, deserialize_with = "string_or_seq")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "string_or_seq")]
    pub dependencies: Vec<String>,
    pub version: Option<String>,
    pub author: Option<String>,
    /// External-spec compatibility shape: nested `metadata:` object.
    pub metadata: Option<NestedMetadata>,
    /// External-spec compatibility field; accepted and parsed but not
    /// retained on [`skillforge_core::Skill`] (not part of the data
    /// model), only used to detect compatibility-shape usage.
    #[serde(rename = "allowed-tools")]
    pub allowed_tools: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct NestedMetadata {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    #[serde(default, deserialize_with = "string_or_seq")]
    pub tags: Vec<String>,
}

/// The flat, resolved view of a frontmatter block regardless of which
/// shape it arrived in.
pub(crate) struct Resolved {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub tags: BTreeSet<String>,
    pub dependencies: Vec<String>,
    pub version: Option<String>,
    pub author: Option<String>,
    pub compatibility_mode: bool,
}

impl RawFrontMatter {
    /// Merge the nested `metadata:` shape over the flat one when present,
    /// returning a compatibility warning when that shape was actually
    /// used (non-fatal, per spec §9 Open Questions — resolved in
    /// DESIGN.md to accept both shapes with a warning).
    pub(crate) fn resolve(self) -> (Resolved, Option<ParseWarning>) {
        let compatibility_mode = self.metadata.is_some() || self.allowed_tools.is_some();

        let (name, description, category, mut tags) = match self.metadata {
            Some(nested) => (
                nested.name.or(self.name),
                nested.description.or(self.description),
                nested.category.or(self.category),
                nested.tags,
            ),
            None => (self.name, self.description, self.category, Vec::new()),
        };

        if tags.is_empty() {
            tags = self.tags;
        }

        let warning = if compatibility_mode {
            Some(ParseWarning::CompatibilityShape(
                "frontmatter used the nested `metadata:`/`allowed-tools` compatibility shape"
                    .to_string(),
            ))
        } else {
            None
        };

        (
            Resolved {
                name,
                description,
                category,
                tags: tags.into_iter().collect(),
                dependencies: self.dependencies,
                version: self.version,
                author: self.author,
                compatibility_mode,
            },
            warning,
        )
    }
}

/// Accepts either a YAML sequence of strings or a single
/// space/comma-delimited string, matching the looseness real-world skill
/// frontmatter exhibits for list-ish fields.
fn string_or_seq<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrSeq {
        Seq(Vec<String>),
        Delimited(String),
        Absent,
    }

    match Option::<StringOrSeq>::deserialize(deserializer)? {
        Some(StringOrSeq::Seq(items)) => Ok(items),
        Some(StringOrSeq::Delimited(s)) => Ok(s
            .split([',', ' '])
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()),
        Some(StringOrSeq::Absent) | None => Ok(Vec::new()),
    }
}
