//! Lifecycle manager for skill source repositories: clone, update, list,
//! remove. Git plumbing goes through `git2` (libgit2), matching the
//! corpus's own git backend of choice; repository records themselves live
//! in the metadata store, not in process memory.

mod error;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use skillforge_core::{RepoId, Repository};
use skillforge_metadata::MetadataStore;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{instrument, warn};

pub use error::RepoManagerError;

/// `(current, total, stage_message)`. Must be non-blocking; called from a
/// blocking I/O thread.
pub type ProgressCallback = Box<dyn Fn(u64, u64, &str) + Send + Sync>;

/// Below this many additional bytes received, progress updates are
/// suppressed to bound callback frequency.
const PROGRESS_THROTTLE_BYTES: u64 = 100_000;

pub struct RepositoryManager {
    base_dir: PathBuf,
    skill_filename: String,
    metadata: MetadataStore,
    locks: DashMap<RepoId, Arc<AsyncMutex<()>>>,
}

impl RepositoryManager {
    pub fn new(base_dir: PathBuf, skill_filename: impl Into<String>, metadata: MetadataStore) -> Self {
        Self {
            base_dir,
            skill_filename: skill_filename.into(),
            metadata,
            locks: DashMap::new(),
        }
    }

    fn lock_for(&self, id: &RepoId) -> Arc<AsyncMutex<()>> {
        self.locks
            .entry(id.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    #[instrument(skip(self))]
    pub async fn add(
        &self,
        url: &str,
        priority: u8,
        license: Option<String>,
    ) -> Result<Repository, RepoManagerError> {
        self.add_with_progress(url, priority, license, None).await
    }

    #[instrument(skip(self, progress))]
    pub async fn add_with_progress(
        &self,
        url: &str,
        priority: u8,
        license: Option<String>,
        progress: Option<ProgressCallback>,
    ) -> Result<Repository, RepoManagerError> {
        validate_url(url)?;
        let id = RepoId::from_url(url);

        if self.metadata.get_repo(&id)?.is_some() {
            return Err(RepoManagerError::AlreadyExists(id));
        }

        let lock = self.lock_for(&id);
        let _guard = lock.lock().await;

        let dest = self.base_dir.join(id.as_str());
        let url_owned = url.to_string();
        let dest_for_clone = dest.clone();
        tokio::task::spawn_blocking(move || clone_repo(&url_owned, &dest_for_clone, progress.as_deref()))
            .await
            .map_err(|e| RepoManagerError::CloneFailed(e.to_string()))??;

        let skill_count = count_skill_files(&dest, &self.skill_filename);

        let mut repo = Repository::new(id, url.to_string(), dest);
        repo.priority = priority;
        repo.license = license;
        repo.skill_count = skill_count;
        repo.last_updated = Utc::now();

        self.metadata.add_repo(&repo)?;
        Ok(repo)
    }

    #[instrument(skip(self))]
    pub async fn update(&self, id: &RepoId) -> Result<Repository, RepoManagerError> {
        self.update_with_progress(id, None).await
    }

    #[instrument(skip(self, progress))]
    pub async fn update_with_progress(
        &self,
        id: &RepoId,
        progress: Option<ProgressCallback>,
    ) -> Result<Repository, RepoManagerError> {
        let mut repo = self
            .metadata
            .get_repo(id)?
            .ok_or_else(|| RepoManagerError::NotFound(id.clone()))?;

        let lock = self.lock_for(id);
        let _guard = lock.lock().await;

        let path = repo.local_path.clone();
        tokio::task::spawn_blocking(move || fetch_and_reset(&path, progress.as_deref()))
            .await
            .map_err(|e| RepoManagerError::FetchFailed(e.to_string()))??;

        repo.skill_count = count_skill_files(&repo.local_path, &self.skill_filename);
        repo.last_updated = Utc::now();

        self.metadata.update_repo(&repo)?;
        Ok(repo)
    }

    /// Ordered by descending priority, then id; same order the Indexing
    /// Engine uses when resolving skill precedence.
    pub fn list(&self) -> Result<Vec<Repository>, RepoManagerError> {
        Ok(self.metadata.list_repos()?)
    }

    #[instrument(skip(self))]
    pub async fn remove(&self, id: &RepoId) -> Result<(), RepoManagerError> {
        let repo = self
            .metadata
            .get_repo(id)?
            .ok_or_else(|| RepoManagerError::NotFound(id.clone()))?;

        self.metadata.remove_repo(id)?;

        if repo.local_path.exists() {
            if let Err(e) = tokio::fs::remove_dir_all(&repo.local_path).await {
                warn!(path = %repo.local_path.display(), error = %e, "failed to remove repository working copy");
            }
        }
        self.locks.remove(id);
        Ok(())
    }

    /// `now - repo.last_updated > max_age`. Scheduling stays the caller's
    /// responsibility; this is a pure predicate.
    pub fn should_update(&self, repo: &Repository, max_age: chrono::Duration) -> bool {
        repo.should_update(Utc::now(), max_age)
    }
}

fn validate_url(url: &str) -> Result<(), RepoManagerError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(RepoManagerError::InvalidUrl("url is empty".into()));
    }
    let has_scheme = trimmed.contains("://");
    let looks_like_scp = trimmed.contains('@') && trimmed.contains(':') && !has_scheme;
    if !has_scheme && !looks_like_scp {
        return Err(RepoManagerError::InvalidUrl(trimmed.to_string()));
    }
    Ok(())
}

fn throttled_callback(progress: &ProgressCallback) -> impl FnMut(git2::Progress<'_>) -> bool + '_ {
    let mut last_reported: u64 = 0;
    move |stats: git2::Progress<'_>| {
        let current = stats.received_bytes() as u64;
        let total_objects = stats.total_objects() as u64;
        let received_objects = stats.received_objects() as u64;
        let done = total_objects > 0 && received_objects == total_objects;
        if done || current.saturating_sub(last_reported) >= PROGRESS_THROTTLE_BYTES {
            progress(current, total_objects, "receiving objects");
            last_reported = current;
        }
        true
    }
}

fn clone_repo(url: &str, dest: &Path, progress: Option<&ProgressCallback>) -> Result<(), RepoManagerError> {
    let mut callbacks = git2::RemoteCallbacks::new();
    if let Some(progress) = progress {
        let mut report = throttled_callback(progress);
        callbacks.transfer_progress(move |stats| report(stats));
    }

    let mut fetch_options = git2::FetchOptions::new();
    fetch_options.depth(1);
    fetch_options.remote_callbacks(callbacks);

    let mut builder = git2::build::RepoBuilder::new();
    builder.fetch_options(fetch_options);
    builder
        .clone(url, dest)
        .map_err(|e| RepoManagerError::CloneFailed(e.to_string()))?;
    Ok(())
}

fn fetch_and_reset(path: &Path, progress: Option<&ProgressCallback>) -> Result<(), RepoManagerError> {
    let repo = git2::Repository::open(path).map_err(|e| RepoManagerError::CorruptClone(e.to_string()))?;
    let mut remote = repo
        .find_remote("origin")
        .map_err(|e| RepoManagerError::CorruptClone(e.to_string()))?;

    let mut callbacks = git2::RemoteCallbacks::new();
    if let Some(progress) = progress {
        let mut report = throttled_callback(progress);
        callbacks.transfer_progress(move |stats| report(stats));
    }

    let mut fetch_options = git2::FetchOptions::new();
    fetch_options.depth(1);
    fetch_options.remote_callbacks(callbacks);

    remote
        .fetch(&[] as &[&str], Some(&mut fetch_options), None)
        .map_err(|e| RepoManagerError::FetchFailed(e.to_string()))?;

    let branch = repo
        .head()
        .ok()
        .and_then(|head| head.shorthand().map(str::to_string))
        .unwrap_or_else(|| "HEAD".to_string());

    let target = repo
        .find_reference(&format!("refs/remotes/origin/{branch}"))
        .or_else(|_| repo.find_reference("FETCH_HEAD"))
        .map_err(|e| RepoManagerError::FetchFailed(e.to_string()))?;
    let commit = target
        .peel_to_commit()
        .map_err(|e| RepoManagerError::CorruptClone(e.to_string()))?;

    repo.reset(commit.as_object(), git2::ResetType::Hard, None)
        .map_err(|e| RepoManagerError::FetchFailed(e.to_string()))?;
    Ok(())
}

fn count_skill_files(root: &Path, skill_filename: &str) -> u64 {
    walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file() && entry.file_name().to_str() == Some(skill_filename)
        })
        .count() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_url_rejects_empty_and_schemeless() {
        assert!(validate_url("").is_err());
        assert!(validate_url("not-a-url").is_err());
    }

    #[test]
    fn validate_url_accepts_https_and_scp_like() {
        assert!(validate_url("https://github.com/org/repo.git").is_ok());
        assert!(validate_url("git@github.com:org/repo.git").is_ok());
    }

    #[test]
    fn count_skill_files_finds_nested_matches() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("testing/tdd")).unwrap();
        std::fs::write(dir.path().join("testing/tdd/SKILL.md"), "x").unwrap();
        std::fs::create_dir_all(dir.path().join("other")).unwrap();
        std::fs::write(dir.path().join("other/SKILL.md"), "x").unwrap();
        std::fs::write(dir.path().join("other/README.md"), "x").unwrap();

        assert_eq!(count_skill_files(dir.path(), "SKILL.md"), 2);
    }

    #[tokio::test]
    async fn remove_unknown_repo_is_not_found() {
        let metadata = MetadataStore::open_in_memory().unwrap();
        let manager = RepositoryManager::new(PathBuf::from("/tmp/skillforge-repo-test"), "SKILL.md", metadata);
        let id = RepoId::from_raw("ghost");
        let err = manager.remove(&id).await.unwrap_err();
        assert!(matches!(err, RepoManagerError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_unknown_repo_is_not_found() {
        let metadata = MetadataStore::open_in_memory().unwrap();
        let manager = RepositoryManager::new(PathBuf::from("/tmp/skillforge-repo-test"), "SKILL.md", metadata);
        let id = RepoId::from_raw("ghost");
        let err = manager.update(&id).await.unwrap_err();
        assert!(matches!(err, RepoManagerError::NotFound(_)));
    }

    #[tokio::test]
    async fn list_reflects_metadata_store() {
        let metadata = MetadataStore::open_in_memory().unwrap();
        let repo = Repository::new(
            RepoId::from_raw("seeded"),
            "https://example.com/seeded.git",
            PathBuf::from("/tmp/seeded"),
        );
        metadata.add_repo(&repo).unwrap();

        let manager = RepositoryManager::new(PathBuf::from("/tmp/skillforge-repo-test"), "SKILL.md", metadata);
        let repos = manager.list().unwrap();
        assert_eq!(repos.len(), 1);
        assert_eq!(repos[0].id, repo.id);
    }
}
