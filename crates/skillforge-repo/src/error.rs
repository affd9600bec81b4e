use skillforge_core::RepoId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoManagerError {
    #[error("invalid git url: {0}")]
    InvalidUrl(String),
    #[error("repository already exists: {0}")]
    AlreadyExists(RepoId),
    #[error("repository not found: {0}")]
    NotFound(RepoId),
    #[error("clone failed: {0}")]
    CloneFailed(String),
    #[error("fetch failed: {0}")]
    FetchFailed(String),
    #[error("clone is corrupt: {0}")]
    CorruptClone(String),
    #[error("storage error: {0}")]
    StorageError(String),
}

impl From<RepoManagerError> for skillforge_core::SkillforgeError {
    fn from(err: RepoManagerError) -> Self {
        match err {
            RepoManagerError::InvalidUrl(msg) => skillforge_core::SkillforgeError::InvalidUrl(msg),
            RepoManagerError::AlreadyExists(id) => {
                skillforge_core::SkillforgeError::StorageError(format!("repository already exists: {id}"))
            }
            RepoManagerError::NotFound(id) => skillforge_core::SkillforgeError::UnknownRepoId(id.as_str().to_string()),
            RepoManagerError::CloneFailed(msg) => skillforge_core::SkillforgeError::CloneFailed(msg),
            RepoManagerError::FetchFailed(msg) => skillforge_core::SkillforgeError::FetchFailed(msg),
            RepoManagerError::CorruptClone(msg) => skillforge_core::SkillforgeError::Corrupt(msg),
            RepoManagerError::StorageError(msg) => skillforge_core::SkillforgeError::StorageError(msg),
        }
    }
}

impl From<skillforge_metadata::MetadataError> for RepoManagerError {
    fn from(err: skillforge_metadata::MetadataError) -> Self {
        RepoManagerError::StorageError(err.to_string())
    }
}

impl From<git2::Error> for RepoManagerError {
    fn from(err: git2::Error) -> Self {
        RepoManagerError::CloneFailed(err.to_string())
    }
}

impl From<std::io::Error> for RepoManagerError {
    fn from(err: std::io::Error) -> Self {
        RepoManagerError::StorageError(err.to_string())
    }
}
