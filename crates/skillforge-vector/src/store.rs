//! The dense-embedding Vector Store (spec.md §4.4), backed by LanceDB.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::Connection;
use skillforge_core::{ScoredSkill, SearchFilters, Skill, SkillId, TextEmbedder};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::error::VectorError;
use crate::filter::build_predicate;
use crate::schema::{self, build_schema};

const TABLE_NAME: &str = "skills";

/// Record count and an approximate on-disk footprint (spec.md §4.4's
/// `stats()`).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VectorStats {
    pub count: usize,
    pub approx_size_bytes: u64,
}

/// Dense-embedding index over skill text. One LanceDB table
/// (`skills`), one row per skill id. Writes (`index`, `remove`, `clear`)
/// take an exclusive guard; `search` takes a shared one — concurrent
/// searches are allowed, but none may run alongside a write (spec.md §5).
pub struct VectorStore {
    connection: Connection,
    dimension: usize,
    embedder: Arc<dyn TextEmbedder>,
    data_dir: PathBuf,
    write_lock: RwLock<()>,
}

impl VectorStore {
    #[instrument(skip(embedder), fields(path = %path.display(), dimension))]
    pub async fn open(path: &Path, dimension: usize, embedder: Arc<dyn TextEmbedder>) -> Result<Self, VectorError> {
        if dimension != embedder.dimension() {
            return Err(VectorError::DimensionMismatch {
                expected: dimension,
                actual: embedder.dimension(),
            });
        }

        tokio::fs::create_dir_all(path).await?;
        let connection = lancedb::connect(&path.to_string_lossy())
            .execute()
            .await
            .map_err(|e| VectorError::Backend(e.to_string()))?;

        let store = Self {
            connection,
            dimension,
            embedder,
            data_dir: path.to_path_buf(),
            write_lock: RwLock::new(()),
        };
        store.ensure_table().await?;
        Ok(store)
    }

    async fn ensure_table(&self) -> Result<(), VectorError> {
        let tables = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| VectorError::Backend(e.to_string()))?;
        if tables.iter().any(|t| t == TABLE_NAME) {
            return Ok(());
        }
        let schema = build_schema(self.dimension);
        self.connection
            .create_empty_table(TABLE_NAME, schema)
            .execute()
            .await
            .map_err(|e| VectorError::Backend(e.to_string()))?;
        debug!(dimension = self.dimension, "created skills table");
        Ok(())
    }

    /// Upsert: overwrites any existing record with the same skill id
    /// (spec.md §4.4). LanceDB has no native upsert, so this deletes the
    /// old row (if any) then inserts the new one.
    #[instrument(skip(self, skill), fields(skill_id = %skill.id))]
    pub async fn index(&self, skill: &Skill) -> Result<(), VectorError> {
        let _guard = self.write_lock.write().await;

        let text = skill.embeddable_text();
        let vector = self.embedder.embed(&text).await?;
        if vector.len() != self.dimension {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }

        let table = self
            .connection
            .open_table(TABLE_NAME)
            .execute()
            .await
            .map_err(|e| VectorError::Backend(e.to_string()))?;

        let predicate = format!("id = '{}'", skill.id.as_str().replace('\'', "''"));
        table.delete(&predicate).await.map_err(|e| VectorError::Backend(e.to_string()))?;

        let schema = build_schema(self.dimension);
        let batch = schema::skill_to_batch(skill, &text, &vector, schema.clone())?;
        let batches = arrow_array::RecordBatchIterator::new(vec![Ok(batch)], schema);
        table.add(Box::new(batches)).execute().await.map_err(|e| VectorError::Backend(e.to_string()))?;

        debug!(skill_id = %skill.id, "indexed skill");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn remove(&self, skill_id: &SkillId) -> Result<(), VectorError> {
        let _guard = self.write_lock.write().await;
        let table = self
            .connection
            .open_table(TABLE_NAME)
            .execute()
            .await
            .map_err(|e| VectorError::Backend(e.to_string()))?;
        let predicate = format!("id = '{}'", skill_id.as_str().replace('\'', "''"));
        table.delete(&predicate).await.map_err(|e| VectorError::Backend(e.to_string()))?;
        Ok(())
    }

    /// Idempotent: drops and recreates the empty table with the same
    /// schema.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<(), VectorError> {
        let _guard = self.write_lock.write().await;
        let tables = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| VectorError::Backend(e.to_string()))?;
        if tables.iter().any(|t| t == TABLE_NAME) {
            self.connection
                .drop_table(TABLE_NAME, &[])
                .await
                .map_err(|e| VectorError::Backend(e.to_string()))?;
        }
        let schema = build_schema(self.dimension);
        self.connection
            .create_empty_table(TABLE_NAME, schema)
            .execute()
            .await
            .map_err(|e| VectorError::Backend(e.to_string()))?;
        Ok(())
    }

    /// Embeds `query_text` through the same embedder used for indexing,
    /// returns up to `top_k` records ordered by descending similarity
    /// (spec.md §4.4). `top_k = 0` or an empty corpus both return `[]`,
    /// never an error (spec.md §8).
    #[instrument(skip(self, filters), fields(top_k))]
    pub async fn search(
        &self,
        query_text: &str,
        top_k: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<ScoredSkill>, VectorError> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let _guard = self.write_lock.read().await;
        let query_vector = self.embedder.embed(query_text).await?;

        let table = self
            .connection
            .open_table(TABLE_NAME)
            .execute()
            .await
            .map_err(|e| VectorError::Backend(e.to_string()))?;

        // Pin cosine distance explicitly: `schema::distance_to_similarity`
        // assumes `_distance` is cosine distance, and the backend's default
        // metric is not guaranteed to be that.
        let mut query = table
            .query()
            .nearest_to(query_vector.as_slice())
            .map_err(|e| VectorError::Backend(e.to_string()))?
            .distance_type(lancedb::DistanceType::Cosine)
            .limit(top_k);

        if let Some(predicate) = build_predicate(filters) {
            query = query.only_if(&predicate);
        }

        let stream = query.execute().await.map_err(|e| VectorError::Backend(e.to_string()))?;
        let batches: Vec<_> = stream.try_collect().await.map_err(|e| VectorError::Backend(e.to_string()))?;

        let mut hits = Vec::new();
        for batch in &batches {
            hits.extend(schema::decode_batch(batch)?);
        }
        hits.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(top_k);

        Ok(hits
            .into_iter()
            .map(|hit| ScoredSkill::new(hit.skill, hit.similarity))
            .collect())
    }

    pub async fn count(&self) -> Result<usize, VectorError> {
        let table = self
            .connection
            .open_table(TABLE_NAME)
            .execute()
            .await
            .map_err(|e| VectorError::Backend(e.to_string()))?;
        table.count_rows(None).await.map_err(|e| VectorError::Backend(e.to_string()))
    }

    pub async fn stats(&self) -> Result<VectorStats, VectorError> {
        let count = self.count().await?;
        let approx_size_bytes = directory_size(&self.data_dir).unwrap_or(0);
        Ok(VectorStats { count, approx_size_bytes })
    }
}

fn directory_size(path: &Path) -> std::io::Result<u64> {
    let mut total = 0u64;
    if !path.exists() {
        return Ok(0);
    }
    for entry in walkdir_entries(path)? {
        if entry.is_file() {
            total += std::fs::metadata(&entry)?.len();
        }
    }
    Ok(total)
}

fn walkdir_entries(root: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else {
                out.push(path);
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillforge_core::{Category, HashEmbedder, RepoId};
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    fn sample_skill(repo: &str, name: &str, description: &str, tags: &[&str], category: Category) -> Skill {
        Skill {
            id: SkillId::new(&RepoId::from_raw(repo), name),
            name: name.to_string(),
            description: description.to_string(),
            instructions: "x".repeat(200),
            category,
            tags: tags.iter().map(|t| t.to_string()).collect::<BTreeSet<_>>(),
            dependencies: BTreeSet::new(),
            examples: vec![],
            file_path: PathBuf::from(format!("/r/{repo}/{name}/SKILL.md")),
            repo_id: RepoId::from_raw(repo),
            version: None,
            author: None,
            updated_at: None,
        }
    }

    async fn open_store(dim: usize) -> (VectorStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let embedder: Arc<dyn TextEmbedder> = Arc::new(HashEmbedder::new(dim));
        let store = VectorStore::open(dir.path(), dim, embedder).await.unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn index_then_search_finds_the_skill() {
        let (store, _dir) = open_store(32).await;
        let skill = sample_skill(
            "repo1",
            "test-driven-development",
            "TDD patterns and practices.",
            &["testing", "tdd"],
            Category::Testing,
        );
        store.index(&skill).await.unwrap();

        let results = store
            .search("test driven development", 5, &SearchFilters::new())
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].skill.id, skill.id);
    }

    #[tokio::test]
    async fn empty_corpus_search_returns_empty_not_error() {
        let (store, _dir) = open_store(32).await;
        let results = store.search("anything", 5, &SearchFilters::new()).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn top_k_zero_returns_empty() {
        let (store, _dir) = open_store(32).await;
        let skill = sample_skill("repo1", "a", "A short description here.", &[], Category::General);
        store.index(&skill).await.unwrap();
        let results = store.search("a", 0, &SearchFilters::new()).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn category_filter_excludes_other_categories() {
        let (store, _dir) = open_store(32).await;
        let testing = sample_skill("repo1", "a", "Testing skill description.", &[], Category::Testing);
        let security = sample_skill("repo1", "b", "Security skill description.", &[], Category::Security);
        store.index(&testing).await.unwrap();
        store.index(&security).await.unwrap();

        let filters = SearchFilters::new().with_category(Category::Security);
        let results = store.search("review", 10, &filters).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].skill.id, security.id);
    }

    #[tokio::test]
    async fn reindexing_overwrites_prior_record() {
        let (store, _dir) = open_store(32).await;
        let mut skill = sample_skill("repo1", "a", "Original description text.", &[], Category::General);
        store.index(&skill).await.unwrap();
        skill.description = "Updated description text.".to_string();
        store.index(&skill).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        let results = store.search("a", 5, &SearchFilters::new()).await.unwrap();
        assert_eq!(results[0].skill.description, "Updated description text.");
    }

    #[tokio::test]
    async fn remove_deletes_the_record() {
        let (store, _dir) = open_store(32).await;
        let skill = sample_skill("repo1", "a", "A short description here.", &[], Category::General);
        store.index(&skill).await.unwrap();
        store.remove(&skill.id).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let (store, _dir) = open_store(32).await;
        let skill = sample_skill("repo1", "a", "A short description here.", &[], Category::General);
        store.index(&skill).await.unwrap();
        store.clear().await.unwrap();
        store.clear().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn stats_reports_record_count() {
        let (store, _dir) = open_store(32).await;
        let skill = sample_skill("repo1", "a", "A short description here.", &[], Category::General);
        store.index(&skill).await.unwrap();
        let stats = store.stats().await.unwrap();
        assert_eq!(stats.count, 1);
    }
}
