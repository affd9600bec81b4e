//! The Indexing Engine & Hybrid Search facade (spec.md §4.6): the single
//! integration point the out-of-scope tool-invocation server depends on.
//! Orchestrates the Parser, Vector Store, and Graph Store into
//! (re)indexing and hybrid query operations.

mod discovery;
mod error;
mod fusion;

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use skillforge_config::Config;
use skillforge_core::{RepoId, ScoredSkill, SearchFilters, Skill, SkillId, TextEmbedder};
use skillforge_graph::GraphStore;
use skillforge_metadata::MetadataStore;
use skillforge_parser::SkillParser;
use skillforge_repo::{ProgressCallback, RepoManagerError, RepositoryManager};
use skillforge_vector::VectorStore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

pub use discovery::{DiscoveredFile, SkillDiscovery, WalkdirDiscovery};
pub use error::IndexError;
pub use skillforge_core::Repository;

/// Which retrieval path `search` should use (spec.md §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    VectorOnly,
    GraphOnly,
    Hybrid,
}

/// Outcome of a `reindex_all` pass (spec.md §4.6, step 5).
#[derive(Debug, Clone, PartialEq)]
pub struct IndexStats {
    pub total_skills: usize,
    pub indexed: usize,
    pub failed: usize,
    pub graph_nodes: usize,
    pub graph_edges: usize,
    pub last_indexed: DateTime<Utc>,
}

/// Orchestrates (re)index passes and hybrid queries across the Vector
/// Store and Graph Store. Owns no persistence of its own beyond an
/// in-memory cache of the most recently indexed skills (used to serve
/// `get_skill`/`list_skills` without a store round-trip).
pub struct Indexer {
    config: Config,
    metadata: MetadataStore,
    repos: Arc<RepositoryManager>,
    vector: Arc<VectorStore>,
    graph: Option<Arc<GraphStore>>,
    discovery: Arc<dyn SkillDiscovery>,
    parser: SkillParser,
    skills: DashMap<SkillId, Skill>,
    last_indexed: Mutex<Option<DateTime<Utc>>>,
}

impl Indexer {
    /// Opens (or creates) every backing store under `config.data_root`
    /// and wires them behind this facade. A corrupt or missing graph
    /// snapshot degrades to `graph: None` with a logged warning rather
    /// than failing outright (spec.md §4.6's "graph store unloaded"
    /// degrade path).
    #[instrument(skip(config, embedder))]
    pub async fn open(config: Config, embedder: Arc<dyn TextEmbedder>) -> Result<Self, IndexError> {
        config.validate()?;

        std::fs::create_dir_all(config.repos_dir())?;
        let legacy_json_path = config.data_root.join("repositories.json");
        let metadata = MetadataStore::open(&config.metadata_db_path(), Some(&legacy_json_path))?;

        let repos = Arc::new(RepositoryManager::new(
            config.repos_dir(),
            config.skill_filename.clone(),
            metadata.clone(),
        ));

        let vector = Arc::new(VectorStore::open(&config.vector_dir(), config.embedding_dim, embedder).await?);

        let graph = match GraphStore::load(&config.graph_snapshot_path()) {
            Ok(store) => Some(Arc::new(store)),
            Err(e) => {
                warn!(error = %e, "graph snapshot failed to load, degrading to vector-only search");
                None
            }
        };

        let discovery: Arc<dyn SkillDiscovery> =
            Arc::new(WalkdirDiscovery::new(repos.clone(), config.skill_filename.clone()));

        Ok(Self {
            config,
            metadata,
            repos,
            vector,
            graph,
            discovery,
            parser: SkillParser::new(),
            skills: DashMap::new(),
            last_indexed: Mutex::new(None),
        })
    }

    /// Substitutes a caller-supplied discovery strategy (e.g. in tests).
    pub fn with_discovery(mut self, discovery: Arc<dyn SkillDiscovery>) -> Self {
        self.discovery = discovery;
        self
    }

    // ---- Indexing --------------------------------------------------

    /// Upserts one skill into the Vector Store, then the Graph Store
    /// (in that order). On Graph Store failure the Vector Store record
    /// is left as-is and the failure is reported — the two stores are
    /// eventually consistent within one reindex pass (spec.md §4.6).
    #[instrument(skip(self, skill), fields(skill_id = %skill.id))]
    pub async fn index_skill(&self, skill: &Skill) -> Result<(), IndexError> {
        self.vector.index(skill).await?;
        if let Some(graph) = &self.graph {
            graph.add_skill(skill)?;
        }
        self.skills.insert(skill.id.clone(), skill.clone());
        Ok(())
    }

    /// `reindex_all(force)` pipeline (spec.md §4.6): optionally clear
    /// both stores, discover every skill file, index each one (counting
    /// but not aborting on per-skill failure), persist the graph
    /// snapshot, and return [`IndexStats`].
    #[instrument(skip(self, cancel))]
    pub async fn reindex_all(&self, force: bool, cancel: CancellationToken) -> Result<IndexStats, IndexError> {
        if force {
            self.vector.clear().await?;
            if let Some(graph) = &self.graph {
                graph.clear();
            }
            self.skills.clear();
        }

        let files = self.discovery.discover().await?;
        let total_skills = files.len();
        let mut indexed = 0usize;
        let mut failed = 0usize;

        for file in files {
            if cancel.is_cancelled() {
                return Err(IndexError::Cancelled);
            }
            match self.parser.parse_file(&file.path, &file.repo_root, &file.repo_id) {
                Ok(parsed) => match self.index_skill(&parsed.skill).await {
                    Ok(()) => indexed += 1,
                    Err(e) => {
                        warn!(path = %file.path.display(), error = %e, "failed to index skill");
                        failed += 1;
                    }
                },
                Err(e) => {
                    warn!(path = %file.path.display(), error = %e, "failed to parse skill file");
                    failed += 1;
                }
            }
        }

        if let Some(graph) = &self.graph {
            graph.save(&self.config.graph_snapshot_path())?;
        }

        let now = Utc::now();
        *self.last_indexed.lock() = Some(now);

        let stats = IndexStats {
            total_skills,
            indexed,
            failed,
            graph_nodes: self.graph.as_ref().map(|g| g.node_count()).unwrap_or(0),
            graph_edges: self.graph.as_ref().map(|g| g.edge_count()).unwrap_or(0),
            last_indexed: now,
        };
        debug!(?stats, "reindex pass complete");
        Ok(stats)
    }

    /// Convenience alias matching the external operation name (spec.md
    /// §6.5): `reindex(force)` is a non-destructive `reindex_all` when
    /// `force` is false, a full rebuild when true.
    pub async fn reindex(&self, force: bool, cancel: CancellationToken) -> Result<IndexStats, IndexError> {
        self.reindex_all(force, cancel).await
    }

    // ---- Hybrid search ----------------------------------------------

    #[instrument(skip(self, cancel), fields(mode = ?mode))]
    pub async fn search(
        &self,
        query: &str,
        top_k: usize,
        filters: &SearchFilters,
        mode: SearchMode,
        vector_weight: f32,
        graph_weight: f32,
        cancel: CancellationToken,
    ) -> Result<Vec<ScoredSkill>, IndexError> {
        if cancel.is_cancelled() {
            return Err(IndexError::Cancelled);
        }
        if top_k == 0 {
            return Ok(Vec::new());
        }

        match mode {
            SearchMode::VectorOnly => {
                let hits = self.vector.search(query, top_k, filters).await?;
                Ok(fusion::rank(hits, top_k))
            }
            SearchMode::GraphOnly => self.search_graph_only(query, top_k, filters),
            SearchMode::Hybrid => {
                self.search_hybrid(query, top_k, filters, vector_weight, graph_weight, cancel).await
            }
        }
    }

    /// Graph-only mode seeds candidates from the union of `HasTag` and
    /// `InCategory` preimages of a tag/category bag-of-words derived from
    /// the query text and the caller's filters, scored by `graph_score`
    /// alone (spec.md §4.6's graph-only edge case). Degrades silently to
    /// an empty result if the graph is unavailable.
    fn search_graph_only(
        &self,
        query: &str,
        top_k: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<ScoredSkill>, IndexError> {
        let Some(graph) = &self.graph else {
            warn!("graph store unavailable, graph-only search returns no results");
            return Ok(Vec::new());
        };

        let mut query_tags: BTreeSet<String> =
            query.split_whitespace().map(|w| w.to_lowercase()).collect();
        query_tags.extend(filters.tags.iter().cloned());

        let mut candidate_ids: BTreeSet<SkillId> = BTreeSet::new();
        for tag in &query_tags {
            candidate_ids.extend(graph.skills_with_tag(tag));
        }
        if let Some(category) = filters.category {
            candidate_ids.extend(graph.skills_in_category(category));
        }
        for word in query.split_whitespace() {
            let lowered = word.to_lowercase();
            if let Some(category) = skillforge_core::Category::all().iter().find(|c| c.as_str() == lowered) {
                candidate_ids.extend(graph.skills_in_category(*category));
            }
        }

        let mut hits = Vec::new();
        for id in candidate_ids {
            let Some(skill) = self.skills.get(&id).map(|r| r.clone()) else { continue };
            if !filters_match(&skill, filters) {
                continue;
            }
            let tb = fusion::tag_boost(&skill.tags, &query_tags);
            let cb = fusion::category_boost(skill.category, filters.category);
            let score = fusion::graph_score(
                tb,
                cb,
                false,
                self.config.tag_boost,
                self.config.category_boost,
                self.config.neighborhood_boost,
            );
            hits.push(ScoredSkill::new(skill, score).with_provenance(skillforge_core::ScoreProvenance::GraphOnly));
        }

        Ok(fusion::rank(hits, top_k))
    }

    async fn search_hybrid(
        &self,
        query: &str,
        top_k: usize,
        filters: &SearchFilters,
        vector_weight: f32,
        graph_weight: f32,
        cancel: CancellationToken,
    ) -> Result<Vec<ScoredSkill>, IndexError> {
        let expanded_k = top_k * self.config.expansion_factor.max(3) as usize;
        let vector_hits = self.vector.search(query, expanded_k, filters).await?;
        if cancel.is_cancelled() {
            return Err(IndexError::Cancelled);
        }
        if vector_hits.is_empty() {
            return Ok(Vec::new());
        }

        let Some(graph) = &self.graph else {
            warn!("graph store unavailable, degrading to vector-only search");
            return Ok(fusion::rank(vector_hits, top_k));
        };

        let seed_id = vector_hits[0].skill.id.clone();
        let neighborhood: BTreeSet<SkillId> =
            graph.neighbors(&seed_id, 1).map(|ns| ns.into_iter().map(|(id, _)| id).collect()).unwrap_or_default();

        let hits = vector_hits
            .into_iter()
            .map(|hit| {
                let tb = fusion::tag_boost(&hit.skill.tags, &filters.tags);
                let cb = fusion::category_boost(hit.skill.category, filters.category);
                let in_neighborhood = neighborhood.contains(&hit.skill.id);
                let gs = fusion::graph_score(
                    tb,
                    cb,
                    in_neighborhood,
                    self.config.tag_boost,
                    self.config.category_boost,
                    self.config.neighborhood_boost,
                );
                let final_score = fusion::fuse_score(hit.score, gs, vector_weight, graph_weight);
                ScoredSkill::new(hit.skill, final_score).with_provenance(skillforge_core::ScoreProvenance::Hybrid)
            })
            .collect();

        Ok(fusion::rank(hits, top_k))
    }

    /// `recommend` is `search` with filters derived from external
    /// toolchain context (spec.md §6.5); the derivation itself is the
    /// out-of-scope caller's responsibility, so this is a thin alias.
    pub async fn recommend(
        &self,
        query: &str,
        top_k: usize,
        filters: &SearchFilters,
        cancel: CancellationToken,
    ) -> Result<Vec<ScoredSkill>, IndexError> {
        self.search(
            query,
            top_k,
            filters,
            SearchMode::Hybrid,
            self.config.vector_weight,
            self.config.graph_weight,
            cancel,
        )
        .await
    }

    // ---- Lookups ------------------------------------------------------

    pub fn get_skill(&self, id: &SkillId) -> Option<Skill> {
        self.skills.get(id).map(|r| r.clone())
    }

    pub fn list_skills(&self, filters: &SearchFilters) -> Vec<Skill> {
        self.skills.iter().map(|r| r.value().clone()).filter(|s| filters_match(s, filters)).collect()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            total_skills: self.skills.len(),
            indexed: self.skills.len(),
            failed: 0,
            graph_nodes: self.graph.as_ref().map(|g| g.node_count()).unwrap_or(0),
            graph_edges: self.graph.as_ref().map(|g| g.edge_count()).unwrap_or(0),
            last_indexed: (*self.last_indexed.lock()).unwrap_or_else(Utc::now),
        }
    }

    // ---- Repository operations ----------------------------------------

    pub async fn repo_add(&self, url: &str, priority: u8, license: Option<String>) -> Result<Repository, IndexError> {
        Ok(self.repos.add(url, priority, license).await?)
    }

    pub async fn repo_add_with_progress(
        &self,
        url: &str,
        priority: u8,
        license: Option<String>,
        progress: Option<ProgressCallback>,
    ) -> Result<Repository, IndexError> {
        Ok(self.repos.add_with_progress(url, priority, license, progress).await?)
    }

    pub async fn repo_update(&self, id: &RepoId) -> Result<Repository, IndexError> {
        self.repos.update(id).await.map_err(|e| match e {
            RepoManagerError::NotFound(id) => IndexError::UnknownRepoId(id.as_str().to_string()),
            other => IndexError::Repo(other),
        })
    }

    pub async fn repo_remove(&self, id: &RepoId) -> Result<(), IndexError> {
        self.repos.remove(id).await.map_err(|e| match e {
            RepoManagerError::NotFound(id) => IndexError::UnknownRepoId(id.as_str().to_string()),
            other => IndexError::Repo(other),
        })
    }

    pub fn repo_list(&self) -> Result<Vec<Repository>, IndexError> {
        Ok(self.repos.list()?)
    }

    /// Advisory: repositories whose `last_updated` exceeds `max_age_hours`.
    /// Scheduling an actual update remains the caller's responsibility
    /// (spec.md §9 Open Questions, resolved in DESIGN.md).
    pub fn check_auto_updates(&self, max_age_hours: u64) -> Result<Vec<Repository>, IndexError> {
        let max_age = chrono::Duration::hours(max_age_hours as i64);
        Ok(self
            .repos
            .list()?
            .into_iter()
            .filter(|r| r.auto_update && self.repos.should_update(r, max_age))
            .collect())
    }

    pub fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }
}

fn filters_match(skill: &Skill, filters: &SearchFilters) -> bool {
    if let Some(category) = filters.category {
        if skill.category != category {
            return false;
        }
    }
    if !filters.repo_ids.is_empty() && !filters.repo_ids.contains(&skill.repo_id) {
        return false;
    }
    if !filters.tags.is_empty() && !filters.tags.iter().all(|t| skill.tags.contains(t)) {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use skillforge_core::{Category, HashEmbedder};
    use std::path::PathBuf;

    fn sample_skill(repo: &str, name: &str, tags: &[&str], category: Category) -> Skill {
        Skill {
            id: SkillId::new(&RepoId::from_raw(repo), name),
            name: name.to_string(),
            description: "a description long enough to pass validation".into(),
            instructions: "x".repeat(60),
            category,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            dependencies: BTreeSet::new(),
            examples: vec![],
            file_path: PathBuf::from(format!("/r/{repo}/{name}/SKILL.md")),
            repo_id: RepoId::from_raw(repo),
            version: None,
            author: None,
            updated_at: None,
        }
    }

    struct EmptyDiscovery;

    #[async_trait]
    impl SkillDiscovery for EmptyDiscovery {
        async fn discover(&self) -> Result<Vec<DiscoveredFile>, IndexError> {
            Ok(Vec::new())
        }
    }

    async fn open_indexer(dir: &std::path::Path) -> Indexer {
        let mut config = Config::default();
        config.data_root = dir.to_path_buf();
        config.embedding_dim = 32;
        let embedder: Arc<dyn TextEmbedder> = Arc::new(HashEmbedder::new(32));
        Indexer::open(config, embedder).await.unwrap().with_discovery(Arc::new(EmptyDiscovery))
    }

    #[tokio::test]
    async fn index_then_search_vector_only_finds_the_skill() {
        let dir = tempfile::tempdir().unwrap();
        let indexer = open_indexer(dir.path()).await;
        let skill = sample_skill("r1", "tdd-basics", &["testing", "tdd"], Category::Testing);
        indexer.index_skill(&skill).await.unwrap();

        let results = indexer
            .search(
                "test driven development",
                5,
                &SearchFilters::new(),
                SearchMode::VectorOnly,
                1.0,
                0.0,
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].skill.id, skill.id);
    }

    #[tokio::test]
    async fn hybrid_search_boosts_matching_tags() {
        let dir = tempfile::tempdir().unwrap();
        let indexer = open_indexer(dir.path()).await;
        let skill = sample_skill("r1", "tdd-basics", &["testing", "tdd"], Category::Testing);
        indexer.index_skill(&skill).await.unwrap();

        let filters = SearchFilters::new().with_tag("testing").with_tag("tdd");
        let results = indexer
            .search(
                "testing",
                5,
                &filters,
                SearchMode::Hybrid,
                0.5,
                0.5,
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].score > 0.5);
    }

    #[tokio::test]
    async fn graph_only_search_seeds_from_tag_words() {
        let dir = tempfile::tempdir().unwrap();
        let indexer = open_indexer(dir.path()).await;
        let skill = sample_skill("r1", "tdd-basics", &["testing"], Category::Testing);
        indexer.index_skill(&skill).await.unwrap();

        let results = indexer
            .search(
                "testing",
                5,
                &SearchFilters::new(),
                SearchMode::GraphOnly,
                0.0,
                1.0,
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].skill.id, skill.id);
    }

    #[tokio::test]
    async fn empty_corpus_search_returns_empty_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let indexer = open_indexer(dir.path()).await;
        let results = indexer
            .search(
                "anything",
                5,
                &SearchFilters::new(),
                SearchMode::Hybrid,
                0.7,
                0.3,
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn top_k_zero_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let indexer = open_indexer(dir.path()).await;
        let results = indexer
            .search(
                "anything",
                0,
                &SearchFilters::new(),
                SearchMode::Hybrid,
                0.7,
                0.3,
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn cancelled_token_aborts_search() {
        let dir = tempfile::tempdir().unwrap();
        let indexer = open_indexer(dir.path()).await;
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = indexer
            .search("anything", 5, &SearchFilters::new(), SearchMode::Hybrid, 0.7, 0.3, cancel)
            .await;
        assert!(matches!(result, Err(IndexError::Cancelled)));
    }

    #[tokio::test]
    async fn get_skill_and_list_skills_reflect_indexed_state() {
        let dir = tempfile::tempdir().unwrap();
        let indexer = open_indexer(dir.path()).await;
        let skill = sample_skill("r1", "a", &["testing"], Category::Testing);
        indexer.index_skill(&skill).await.unwrap();

        assert_eq!(indexer.get_skill(&skill.id), Some(skill.clone()));
        assert_eq!(indexer.list_skills(&SearchFilters::new()).len(), 1);
        assert_eq!(indexer.list_skills(&SearchFilters::new().with_category(Category::Security)).len(), 0);
    }

    #[tokio::test]
    async fn reindex_all_persists_graph_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let config = {
            let mut c = Config::default();
            c.data_root = dir.path().to_path_buf();
            c.embedding_dim = 32;
            c
        };
        let snapshot_path = config.graph_snapshot_path();
        let embedder: Arc<dyn TextEmbedder> = Arc::new(HashEmbedder::new(32));
        let indexer = Indexer::open(config, embedder).await.unwrap().with_discovery(Arc::new(EmptyDiscovery));

        let stats = indexer.reindex_all(false, CancellationToken::new()).await.unwrap();
        assert_eq!(stats.total_skills, 0);
        assert!(snapshot_path.exists());
    }

    #[tokio::test]
    async fn repo_update_on_unknown_id_maps_to_unknown_repo_id() {
        let dir = tempfile::tempdir().unwrap();
        let indexer = open_indexer(dir.path()).await;
        let result = indexer.repo_update(&RepoId::from_raw("does-not-exist")).await;
        assert!(matches!(result, Err(IndexError::UnknownRepoId(_))));
    }

    #[tokio::test]
    async fn repo_remove_on_unknown_id_maps_to_unknown_repo_id() {
        let dir = tempfile::tempdir().unwrap();
        let indexer = open_indexer(dir.path()).await;
        let result = indexer.repo_remove(&RepoId::from_raw("does-not-exist")).await;
        assert!(matches!(result, Err(IndexError::UnknownRepoId(_))));
    }
}
