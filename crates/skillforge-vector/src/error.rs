use thiserror::Error;

#[derive(Debug, Error)]
pub enum VectorError {
    #[error("vector store backend error: {0}")]
    Backend(String),
    #[error("query embedding failed: {0}")]
    QueryEmbeddingFailed(#[from] skillforge_core::EmbedError),
    #[error("embedding dimension mismatch: expected {expected}, got {actual}; store must be rebuilt")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("stored record for skill {0} is corrupt: {1}")]
    CorruptRecord(String, String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<VectorError> for skillforge_core::SkillforgeError {
    fn from(err: VectorError) -> Self {
        match err {
            VectorError::Backend(msg) => skillforge_core::SkillforgeError::StorageError(msg),
            VectorError::QueryEmbeddingFailed(e) => skillforge_core::SkillforgeError::StorageError(e.to_string()),
            VectorError::DimensionMismatch { expected, actual } => {
                skillforge_core::SkillforgeError::EmbeddingDimensionMismatch { expected, actual }
            }
            VectorError::CorruptRecord(id, msg) => {
                skillforge_core::SkillforgeError::Corrupt(format!("{id}: {msg}"))
            }
            VectorError::Io(e) => skillforge_core::SkillforgeError::IoError(e),
        }
    }
}
