//! Layered configuration for skillforge.
//!
//! Configuration is read once at startup (spec §6.4: "mutations during
//! runtime are explicit, no file-watching"). The layers, lowest to
//! highest precedence: compiled-in [`Config::default`], an optional TOML
//! (or YAML) file, then environment variable overrides prefixed
//! `SKILLFORGE_`.

mod error;
mod loader;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use error::ConfigError;
pub use loader::ConfigLoader;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A declared skill source, from the `repositories[]` configuration option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositorySpec {
    pub url: String,
    #[serde(default = "default_priority")]
    pub priority: u8,
    pub license: Option<String>,
    #[serde(default)]
    pub auto_update: bool,
}

fn default_priority() -> u8 {
    50
}

/// Recognized configuration options from spec §6.4.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of all persisted state.
    pub data_root: PathBuf,
    /// File basename recognized as a skill.
    pub skill_filename: String,
    /// Fixed vector dimension D for a fresh vector store.
    pub embedding_dim: usize,
    /// Default fusion weight applied to the vector-similarity score.
    pub vector_weight: f32,
    /// Default fusion weight applied to the graph-derived boost.
    pub graph_weight: f32,
    /// Vector over-fetch multiplier in hybrid mode. Must be >= 3.
    pub expansion_factor: u32,
    /// Staleness threshold, in hours, for the advisory auto-update check.
    pub auto_update_max_age_hours: u64,
    pub tag_boost: f32,
    pub category_boost: f32,
    pub neighborhood_boost: f32,
    pub repositories: Vec<RepositorySpec>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("./skillforge-data"),
            skill_filename: "SKILL.md".to_string(),
            embedding_dim: 384,
            vector_weight: 0.7,
            graph_weight: 0.3,
            expansion_factor: 5,
            auto_update_max_age_hours: 24,
            tag_boost: 1.0,
            category_boost: 1.0,
            neighborhood_boost: 0.1,
            repositories: Vec::new(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// `data_root/repos`.
    pub fn repos_dir(&self) -> PathBuf {
        self.data_root.join("repos")
    }

    /// `data_root/vector`.
    pub fn vector_dir(&self) -> PathBuf {
        self.data_root.join("vector")
    }

    /// `data_root/graph.snapshot`.
    pub fn graph_snapshot_path(&self) -> PathBuf {
        self.data_root.join("graph.snapshot")
    }

    /// `data_root/metadata.db`.
    pub fn metadata_db_path(&self) -> PathBuf {
        self.data_root.join("metadata.db")
    }

    /// Validate cross-field invariants not expressible in the type system
    /// alone (e.g. `expansion_factor >= 3`).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.expansion_factor < 3 {
            return Err(ConfigError::Invalid(format!(
                "expansion_factor must be >= 3, got {}",
                self.expansion_factor
            )));
        }
        if self.embedding_dim == 0 {
            return Err(ConfigError::Invalid("embedding_dim must be > 0".into()));
        }
        for repo in &self.repositories {
            if repo.priority > 100 {
                return Err(ConfigError::Invalid(format!(
                    "repository priority must be 0-100, got {} for {}",
                    repo.priority, repo.url
                )));
            }
        }
        Ok(())
    }
}
