use skillforge_core::{EmbedError, SkillforgeError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error(transparent)]
    Parse(#[from] skillforge_parser::ParseError),
    #[error(transparent)]
    Repo(#[from] skillforge_repo::RepoManagerError),
    #[error("unknown repository id: {0}")]
    UnknownRepoId(String),
    #[error(transparent)]
    Vector(#[from] skillforge_vector::VectorError),
    #[error(transparent)]
    Graph(#[from] skillforge_graph::GraphError),
    #[error(transparent)]
    Metadata(#[from] skillforge_metadata::MetadataError),
    #[error("invalid configuration: {0}")]
    Config(#[from] skillforge_config::ConfigError),
    #[error(transparent)]
    Embed(#[from] EmbedError),
    #[error("query embedding failed: {0}")]
    QueryEmbeddingFailed(String),
    #[error("retrieval failed: {0}")]
    RetrievalFailed(String),
    #[error("reindex completed with {failed} per-file failures out of {total}")]
    PartialIndex { total: usize, failed: usize },
    #[error("graph store unavailable, degraded to vector-only search")]
    GraphUnavailable,
    #[error("operation cancelled")]
    Cancelled,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<IndexError> for SkillforgeError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::Parse(e) => e.into(),
            IndexError::Repo(e) => e.into(),
            IndexError::UnknownRepoId(id) => SkillforgeError::UnknownRepoId(id),
            IndexError::Vector(e) => e.into(),
            IndexError::Graph(e) => e.into(),
            IndexError::Metadata(e) => e.into(),
            IndexError::Config(e) => SkillforgeError::StorageError(e.to_string()),
            IndexError::Embed(e) => SkillforgeError::StorageError(e.to_string()),
            IndexError::QueryEmbeddingFailed(msg) => SkillforgeError::StorageError(msg),
            IndexError::RetrievalFailed(msg) => SkillforgeError::StorageError(msg),
            IndexError::PartialIndex { total, failed } => SkillforgeError::PartialIndex { total, failed },
            IndexError::GraphUnavailable => SkillforgeError::GraphUnavailable,
            IndexError::Cancelled => SkillforgeError::Cancelled,
            IndexError::Io(e) => SkillforgeError::IoError(e),
        }
    }
}
