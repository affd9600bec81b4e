//! Node and edge types for the typed skill graph (spec.md §3, §4.5).

use serde::{Deserialize, Serialize};
use skillforge_core::{Category, RepoId, SkillId};

/// A node key uniquely identifies a node regardless of its attributes,
/// for the side index that maps key → `NodeIndex`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NodeKey {
    Skill(SkillId),
    Tag(String),
    Category(String),
}

/// A graph node: skill nodes carry enough attributes to answer
/// neighborhood queries without a side lookup; tag/category nodes carry
/// only their token (spec.md §3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraphNode {
    Skill { id: SkillId, name: String, repo_id: RepoId, category: Category },
    Tag(String),
    Category(String),
}

impl GraphNode {
    pub fn key(&self) -> NodeKey {
        match self {
            GraphNode::Skill { id, .. } => NodeKey::Skill(id.clone()),
            GraphNode::Tag(tag) => NodeKey::Tag(tag.clone()),
            GraphNode::Category(cat) => NodeKey::Category(cat.clone()),
        }
    }

    pub fn skill_id(&self) -> Option<&SkillId> {
        match self {
            GraphNode::Skill { id, .. } => Some(id),
            _ => None,
        }
    }
}

/// A typed edge (spec.md §3). `SharesTag` is never stored — it is
/// derived on demand from the `HasTag` bipartite projection
/// (`related_by_tags`) — so it has no variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraphEdge {
    HasTag,
    InCategory,
    DependsOn,
}
