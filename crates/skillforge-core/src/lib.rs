//! Shared types for the skillforge hybrid indexing and retrieval core.
//!
//! This crate defines the data model shared by every component crate
//! (parser, metadata store, repository manager, vector store, graph store,
//! indexing engine) and the dependency-inversion seams between them: the
//! [`TextEmbedder`] trait lets the vector store stay agnostic to the
//! embedding backend, and [`SkillforgeError`] lets callers match on one
//! error type without depending on every component crate's error enum.

pub mod category;
pub mod embed;
pub mod error;
pub mod filters;
pub mod ids;
pub mod repository;
pub mod scored;
pub mod skill;

pub use category::Category;
pub use embed::{EmbedError, FixedDimensionEmbedder, HashEmbedder, TextEmbedder};
pub use error::SkillforgeError;
pub use filters::SearchFilters;
pub use ids::{RepoId, SkillId};
pub use repository::Repository;
pub use scored::{ScoredSkill, ScoreProvenance};
pub use skill::Skill;

#[cfg(feature = "test-utils")]
pub mod test_support;
