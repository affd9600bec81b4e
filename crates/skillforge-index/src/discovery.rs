//! Enumerates skill files across every repository the Indexing Engine
//! should scan. Contract lives here rather than on the Repository
//! Manager itself so the engine's dependency is a trait object — the
//! out-of-scope server composes the default implementation from the
//! Repository Manager's repo list plus a filesystem walk (spec.md §4.6:
//! "delegated to the surrounding Skill Discovery service").

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use skillforge_core::RepoId;
use skillforge_repo::RepositoryManager;

use crate::error::IndexError;

/// One skill file found during discovery, identifying both the file and
/// the repository root needed to compute its relative identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    pub repo_root: PathBuf,
    pub repo_id: RepoId,
}

#[async_trait]
pub trait SkillDiscovery: Send + Sync {
    /// Every skill file across every known repository, in a stable order
    /// (sorted by `repo_id` then relative path, per spec.md §5's
    /// ordering guarantee for `reindex_all`).
    async fn discover(&self) -> Result<Vec<DiscoveredFile>, IndexError>;
}

/// Default [`SkillDiscovery`]: lists repositories via the Repository
/// Manager, then walks each repository root for files named
/// `skill_filename` (matching the corpus's own `walkdir`-based
/// repository-tree scans).
pub struct WalkdirDiscovery {
    repos: Arc<RepositoryManager>,
    skill_filename: String,
}

impl WalkdirDiscovery {
    pub fn new(repos: Arc<RepositoryManager>, skill_filename: impl Into<String>) -> Self {
        Self { repos, skill_filename: skill_filename.into() }
    }
}

#[async_trait]
impl SkillDiscovery for WalkdirDiscovery {
    async fn discover(&self) -> Result<Vec<DiscoveredFile>, IndexError> {
        let repos = self.repos.list()?;
        let skill_filename = self.skill_filename.clone();

        let mut files = tokio::task::spawn_blocking(move || {
            let mut found = Vec::new();
            for repo in &repos {
                for entry in walkdir::WalkDir::new(&repo.local_path)
                    .into_iter()
                    .filter_map(Result::ok)
                {
                    if entry.file_type().is_file() && entry.file_name().to_string_lossy() == skill_filename {
                        found.push(DiscoveredFile {
                            path: entry.path().to_path_buf(),
                            repo_root: repo.local_path.clone(),
                            repo_id: repo.id.clone(),
                        });
                    }
                }
            }
            found
        })
        .await
        .map_err(|e| IndexError::RetrievalFailed(e.to_string()))?;

        files.sort_by(|a, b| a.repo_id.as_str().cmp(b.repo_id.as_str()).then_with(|| a.path.cmp(&b.path)));
        Ok(files)
    }
}
