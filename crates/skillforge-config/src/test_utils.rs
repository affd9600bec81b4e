//! Test-only configuration builder, modeled on the layered builder pattern
//! used throughout this codebase's test suites.

use std::path::PathBuf;

use crate::{Config, RepositorySpec};

/// Fluent builder for constructing [`Config`] values in tests without
/// repeating every field.
pub struct TestConfigBuilder {
    config: Config,
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn data_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_root = path.into();
        self
    }

    pub fn embedding_dim(mut self, dim: usize) -> Self {
        self.config.embedding_dim = dim;
        self
    }

    pub fn fusion_weights(mut self, vector_weight: f32, graph_weight: f32) -> Self {
        self.config.vector_weight = vector_weight;
        self.config.graph_weight = graph_weight;
        self
    }

    pub fn repository(mut self, repo: RepositorySpec) -> Self {
        self.config.repositories.push(repo);
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_requested_fields_only() {
        let config = TestConfigBuilder::new().embedding_dim(16).build();
        assert_eq!(config.embedding_dim, 16);
        assert_eq!(config.skill_filename, Config::default().skill_filename);
    }
}
