//! The Graph Store: an in-memory typed graph over skills, tags, and
//! categories (spec.md §3, §4.5), snapshotted to disk with `bincode`.

pub mod error;
pub mod types;

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::Path;

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use skillforge_core::{RepoId, Skill, SkillId};
use tracing::{debug, instrument};

pub use error::GraphError;
pub use types::{GraphEdge, GraphNode, NodeKey};

#[derive(Serialize, Deserialize, Default)]
struct Snapshot {
    graph: StableDiGraph<GraphNode, GraphEdge>,
    // BTreeMap rather than HashMap: this field is bincode-encoded by `save`,
    // and HashMap's per-instance random iteration order would make two
    // structurally-identical graphs serialize to different bytes.
    index: BTreeMap<NodeKey, NodeIndex>,
}

/// Maintains a typed graph over skills, tags, and categories. Not
/// thread-safe by construction (spec.md §5): the caller (Indexing Engine)
/// serializes writes; reads may run concurrently with each other.
pub struct GraphStore {
    inner: RwLock<Snapshot>,
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphStore {
    pub fn new() -> Self {
        Self { inner: RwLock::new(Snapshot::default()) }
    }

    fn ensure_node(snapshot: &mut Snapshot, node: GraphNode) -> NodeIndex {
        let key = node.key();
        if let Some(&idx) = snapshot.index.get(&key) {
            snapshot.graph[idx] = node;
            idx
        } else {
            let idx = snapshot.graph.add_node(node);
            snapshot.index.insert(key, idx);
            idx
        }
    }

    fn find_node(snapshot: &Snapshot, key: &NodeKey) -> Option<NodeIndex> {
        snapshot.index.get(key).copied()
    }

    /// Upserts `skill`'s node and its `HasTag`/`InCategory`/`DependsOn`
    /// edges (spec.md §4.5). Any previously-stored outgoing edges for this
    /// skill are dropped first so a changed tag/category/dependency set on
    /// re-parse doesn't leave stale edges behind.
    #[instrument(skip(self, skill), fields(skill_id = %skill.id))]
    pub fn add_skill(&self, skill: &Skill) -> Result<(), GraphError> {
        let mut snapshot = self.inner.write();

        let skill_idx = Self::ensure_node(
            &mut snapshot,
            GraphNode::Skill {
                id: skill.id.clone(),
                name: skill.name.clone(),
                repo_id: skill.repo_id.clone(),
                category: skill.category,
            },
        );

        let stale: Vec<_> = snapshot
            .graph
            .edges(skill_idx)
            .map(|e| e.id())
            .collect();
        for edge_id in stale {
            snapshot.graph.remove_edge(edge_id);
        }

        for tag in &skill.tags {
            let tag_idx = Self::ensure_node(&mut snapshot, GraphNode::Tag(tag.clone()));
            snapshot.graph.add_edge(skill_idx, tag_idx, GraphEdge::HasTag);
        }

        let category_idx =
            Self::ensure_node(&mut snapshot, GraphNode::Category(skill.category.as_str().to_string()));
        snapshot.graph.add_edge(skill_idx, category_idx, GraphEdge::InCategory);

        for dep in &skill.dependencies {
            if dep == &skill.id {
                continue;
            }
            let dep_idx = match Self::find_node(&snapshot, &NodeKey::Skill(dep.clone())) {
                Some(idx) => idx,
                None => Self::ensure_node(
                    &mut snapshot,
                    GraphNode::Skill {
                        id: dep.clone(),
                        name: dep.as_str().to_string(),
                        repo_id: dep.repo_id().map(RepoId::from_raw).unwrap_or_else(|| skill.repo_id.clone()),
                        category: skillforge_core::Category::default(),
                    },
                ),
            };
            snapshot.graph.add_edge(skill_idx, dep_idx, GraphEdge::DependsOn);
        }

        debug!(skill_id = %skill.id, tags = skill.tags.len(), deps = skill.dependencies.len(), "graph node upserted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn remove_skill(&self, id: &SkillId) -> Result<(), GraphError> {
        let mut snapshot = self.inner.write();
        let key = NodeKey::Skill(id.clone());
        let idx = snapshot
            .index
            .remove(&key)
            .ok_or_else(|| GraphError::UnknownSkillId(id.as_str().to_string()))?;
        snapshot.graph.remove_node(idx);
        Ok(())
    }

    pub fn clear(&self) {
        let mut snapshot = self.inner.write();
        *snapshot = Snapshot::default();
    }

    pub fn node_count(&self) -> usize {
        self.inner.read().graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.read().graph.edge_count()
    }

    /// All skill ids with a `HasTag` edge to `tag`. Used by the
    /// graph-only search mode to seed a candidate set from a bag of
    /// query words (spec.md §4.6: "union of `HasTag` and `InCategory`
    /// preimages").
    pub fn skills_with_tag(&self, tag: &str) -> Vec<SkillId> {
        let snapshot = self.inner.read();
        let Some(&tag_idx) = snapshot.index.get(&NodeKey::Tag(tag.to_string())) else {
            return Vec::new();
        };
        snapshot
            .graph
            .neighbors_directed(tag_idx, Direction::Incoming)
            .filter_map(|idx| snapshot.graph[idx].skill_id().cloned())
            .collect()
    }

    /// All skill ids with an `InCategory` edge to `category`.
    pub fn skills_in_category(&self, category: skillforge_core::Category) -> Vec<SkillId> {
        let snapshot = self.inner.read();
        let Some(&category_idx) = snapshot.index.get(&NodeKey::Category(category.as_str().to_string())) else {
            return Vec::new();
        };
        snapshot
            .graph
            .neighbors_directed(category_idx, Direction::Incoming)
            .filter_map(|idx| snapshot.graph[idx].skill_id().cloned())
            .collect()
    }

    /// Breadth-first expansion over `HasTag`, `InCategory`, and
    /// `DependsOn` edges up to `depth` hops, returning skill ids reached
    /// (not tag/category hub nodes) with shortest-path distance (spec.md
    /// §4.5). Traversal treats edges as undirected, since a path often
    /// runs skill → tag → other-skill.
    #[instrument(skip(self))]
    pub fn neighbors(&self, id: &SkillId, depth: usize) -> Result<Vec<(SkillId, usize)>, GraphError> {
        let snapshot = self.inner.read();
        let start = Self::find_node(&snapshot, &NodeKey::Skill(id.clone()))
            .ok_or_else(|| GraphError::UnknownSkillId(id.as_str().to_string()))?;

        let mut distances: HashMap<NodeIndex, usize> = HashMap::new();
        distances.insert(start, 0);
        let mut queue = VecDeque::new();
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            let current_dist = distances[&current];
            if current_dist >= depth {
                continue;
            }
            for neighbor in snapshot.graph.neighbors_undirected(current) {
                if !distances.contains_key(&neighbor) {
                    distances.insert(neighbor, current_dist + 1);
                    queue.push_back(neighbor);
                }
            }
        }

        let mut results: Vec<(SkillId, usize)> = distances
            .into_iter()
            .filter(|(idx, dist)| *idx != start && *dist > 0)
            .filter_map(|(idx, dist)| snapshot.graph[idx].skill_id().map(|sid| (sid.clone(), dist)))
            .collect();
        results.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        Ok(results)
    }

    /// For every other skill sharing at least `min_shared` tags with
    /// `id`, returns `(other_id, shared_count)` sorted by shared_count
    /// descending, ties broken by skill id ascending (spec.md §4.5).
    /// `SharesTag` is never stored; this derives it from the `HasTag`
    /// bipartite projection on every call.
    #[instrument(skip(self))]
    pub fn related_by_tags(&self, id: &SkillId, min_shared: usize) -> Result<Vec<(SkillId, usize)>, GraphError> {
        let snapshot = self.inner.read();
        let start = Self::find_node(&snapshot, &NodeKey::Skill(id.clone()))
            .ok_or_else(|| GraphError::UnknownSkillId(id.as_str().to_string()))?;

        let mut shared: HashMap<NodeIndex, usize> = HashMap::new();
        for tag_idx in snapshot.graph.neighbors_directed(start, Direction::Outgoing) {
            if !matches!(snapshot.graph[tag_idx], GraphNode::Tag(_)) {
                continue;
            }
            for other in snapshot.graph.neighbors_directed(tag_idx, Direction::Incoming) {
                if other == start {
                    continue;
                }
                *shared.entry(other).or_insert(0) += 1;
            }
        }

        let mut results: Vec<(SkillId, usize)> = shared
            .into_iter()
            .filter(|(_, count)| *count >= min_shared.max(1))
            .filter_map(|(idx, count)| snapshot.graph[idx].skill_id().map(|sid| (sid.clone(), count)))
            .collect();
        results.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(results)
    }

    /// Direct or transitive `DependsOn` targets of `id` (spec.md §4.5).
    #[instrument(skip(self))]
    pub fn dependencies_of(&self, id: &SkillId, transitive: bool) -> Result<Vec<SkillId>, GraphError> {
        let snapshot = self.inner.read();
        let start = Self::find_node(&snapshot, &NodeKey::Skill(id.clone()))
            .ok_or_else(|| GraphError::UnknownSkillId(id.as_str().to_string()))?;

        if !transitive {
            let mut direct: Vec<SkillId> = depends_on_targets(&snapshot.graph, start).collect();
            direct.sort();
            return Ok(direct);
        }

        let mut seen: HashMap<NodeIndex, ()> = HashMap::new();
        let mut queue = VecDeque::from([start]);
        let mut out = Vec::new();
        while let Some(current) = queue.pop_front() {
            for target in depends_on_indices(&snapshot.graph, current) {
                if seen.insert(target, ()).is_none() {
                    if let Some(sid) = snapshot.graph[target].skill_id() {
                        out.push(sid.clone());
                    }
                    queue.push_back(target);
                }
            }
        }
        out.sort();
        out.dedup();
        Ok(out)
    }

    /// Serializes the whole graph to `path` atomically: write to a
    /// sibling temp file, fsync, then rename over the destination, so a
    /// crash mid-save never corrupts the prior snapshot (spec.md §4.5).
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn save(&self, path: &Path) -> Result<(), GraphError> {
        let snapshot = self.inner.read();
        let bytes = bincode::serde::encode_to_vec(&*snapshot, bincode::config::standard())
            .map_err(|e| GraphError::Serialization(e.to_string()))?;
        drop(snapshot);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp_path = path.with_extension("tmp");
        {
            use std::io::Write;
            let mut file = std::fs::File::create(&tmp_path)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp_path, path)?;
        debug!(bytes = bytes.len(), "graph snapshot saved");
        Ok(())
    }

    /// Restores a graph previously written by [`Self::save`]. A missing
    /// file is treated as an empty graph (first run has nothing to
    /// restore yet).
    #[instrument(fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, GraphError> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let bytes = std::fs::read(path)?;
        let (snapshot, _): (Snapshot, usize) = bincode::serde::decode_from_slice(&bytes, bincode::config::standard())
            .map_err(|e| GraphError::Serialization(e.to_string()))?;
        Ok(Self { inner: RwLock::new(snapshot) })
    }
}

fn depends_on_indices(graph: &StableDiGraph<GraphNode, GraphEdge>, node: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
    graph
        .edges_directed(node, Direction::Outgoing)
        .filter(|e| *e.weight() == GraphEdge::DependsOn)
        .map(|e| e.target())
}

fn depends_on_targets(graph: &StableDiGraph<GraphNode, GraphEdge>, node: NodeIndex) -> impl Iterator<Item = SkillId> + '_ {
    depends_on_indices(graph, node).filter_map(move |idx| graph[idx].skill_id().cloned())
}
