use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("graph snapshot is corrupt: {0}")]
    Serialization(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("skill {0} not found in graph")]
    UnknownSkillId(String),
}

impl From<GraphError> for skillforge_core::SkillforgeError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::Serialization(msg) => skillforge_core::SkillforgeError::Corrupt(msg),
            GraphError::Io(e) => skillforge_core::SkillforgeError::IoError(e),
            GraphError::UnknownSkillId(id) => skillforge_core::SkillforgeError::UnknownSkillId(id),
        }
    }
}
