use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("metadata store is busy")]
    StorageBusy,
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
    #[error("metadata store is corrupt: {0}")]
    Corrupt(String),
    #[error("unknown repository id: {0}")]
    UnknownRepoId(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<MetadataError> for skillforge_core::SkillforgeError {
    fn from(err: MetadataError) -> Self {
        match err {
            MetadataError::StorageBusy => skillforge_core::SkillforgeError::StorageBusy,
            MetadataError::ConstraintViolation(msg) => skillforge_core::SkillforgeError::StorageError(msg),
            MetadataError::Corrupt(msg) => skillforge_core::SkillforgeError::Corrupt(msg),
            MetadataError::UnknownRepoId(id) => skillforge_core::SkillforgeError::UnknownRepoId(id),
            MetadataError::Io(e) => skillforge_core::SkillforgeError::IoError(e),
        }
    }
}

impl From<rusqlite::Error> for MetadataError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == rusqlite::ErrorCode::DatabaseBusy
                    || e.code == rusqlite::ErrorCode::DatabaseLocked =>
            {
                MetadataError::StorageBusy
            }
            rusqlite::Error::SqliteFailure(e, msg)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                MetadataError::ConstraintViolation(
                    msg.clone().unwrap_or_else(|| err.to_string()),
                )
            }
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == rusqlite::ErrorCode::NotADatabase
                    || e.code == rusqlite::ErrorCode::Corrupt =>
            {
                MetadataError::Corrupt(err.to_string())
            }
            _ => MetadataError::Corrupt(err.to_string()),
        }
    }
}
