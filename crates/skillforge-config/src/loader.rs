//! Loads [`Config`] from its three layers: compiled defaults, an optional
//! file, then `SKILLFORGE_*` environment variable overrides.

use std::path::PathBuf;

use crate::{Config, ConfigError};

/// Builds a [`Config`] by layering a file (if given) over the defaults,
/// then applying environment variable overrides.
pub struct ConfigLoader {
    file_path: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { file_path: None }
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Load and validate the fully-layered configuration.
    pub async fn load(&self) -> Result<Config, ConfigError> {
        let mut config = match &self.file_path {
            Some(path) => Self::load_file(path).await?,
            None => Config::default(),
        };

        Self::apply_env_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    async fn load_file(path: &PathBuf) -> Result<Config, ConfigError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.display().to_string(),
                source,
            })?;

        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );

        if is_yaml {
            #[cfg(feature = "yaml")]
            {
                serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })
            }
            #[cfg(not(feature = "yaml"))]
            {
                Err(ConfigError::Parse {
                    path: path.display().to_string(),
                    message: "yaml support not compiled in".into(),
                })
            }
        } else {
            #[cfg(feature = "toml")]
            {
                toml::from_str(&contents).map_err(|e| ConfigError::Parse {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })
            }
            #[cfg(not(feature = "toml"))]
            {
                Err(ConfigError::Parse {
                    path: path.display().to_string(),
                    message: "toml support not compiled in".into(),
                })
            }
        }
    }

    fn apply_env_overrides(config: &mut Config) {
        if let Ok(v) = std::env::var("SKILLFORGE_DATA_ROOT") {
            config.data_root = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("SKILLFORGE_SKILL_FILENAME") {
            config.skill_filename = v;
        }
        if let Some(v) = parse_env("SKILLFORGE_EMBEDDING_DIM") {
            config.embedding_dim = v;
        }
        if let Some(v) = parse_env("SKILLFORGE_VECTOR_WEIGHT") {
            config.vector_weight = v;
        }
        if let Some(v) = parse_env("SKILLFORGE_GRAPH_WEIGHT") {
            config.graph_weight = v;
        }
        if let Some(v) = parse_env("SKILLFORGE_EXPANSION_FACTOR") {
            config.expansion_factor = v;
        }
        if let Some(v) = parse_env("SKILLFORGE_AUTO_UPDATE_MAX_AGE_HOURS") {
            config.auto_update_max_age_hours = v;
        }
        if let Some(v) = parse_env("SKILLFORGE_TAG_BOOST") {
            config.tag_boost = v;
        }
        if let Some(v) = parse_env("SKILLFORGE_CATEGORY_BOOST") {
            config.category_boost = v;
        }
        if let Some(v) = parse_env("SKILLFORGE_NEIGHBORHOOD_BOOST") {
            config.neighborhood_boost = v;
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn loads_defaults_when_no_file_given() {
        let config = ConfigLoader::new().load().await.unwrap();
        assert_eq!(config, Config::default());
    }

    #[tokio::test]
    async fn loads_partial_toml_file_falling_back_to_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(file, "embedding_dim = 256\nskill_filename = \"SKILL.md\"\n").unwrap();

        let config = ConfigLoader::new()
            .with_file(file.path())
            .load()
            .await
            .unwrap();

        assert_eq!(config.embedding_dim, 256);
        // Untouched fields keep their defaults.
        assert_eq!(config.vector_weight, Config::default().vector_weight);
    }

    #[tokio::test]
    async fn loads_repositories_from_toml() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
[[repositories]]
url = "https://example.com/skills-a.git"
priority = 80
auto_update = true
"#
        )
        .unwrap();

        let config = ConfigLoader::new()
            .with_file(file.path())
            .load()
            .await
            .unwrap();

        assert_eq!(config.repositories.len(), 1);
        assert_eq!(config.repositories[0].priority, 80);
        assert!(config.repositories[0].auto_update);
    }

    #[tokio::test]
    async fn missing_file_surfaces_io_error() {
        let result = ConfigLoader::new()
            .with_file("/nonexistent/path/config.toml")
            .load()
            .await;
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[tokio::test]
    #[serial_test::serial]
    async fn env_override_takes_precedence_over_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(file, "embedding_dim = 256\n").unwrap();

        std::env::set_var("SKILLFORGE_EMBEDDING_DIM", "512");
        let config = ConfigLoader::new()
            .with_file(file.path())
            .load()
            .await
            .unwrap();
        std::env::remove_var("SKILLFORGE_EMBEDDING_DIM");

        assert_eq!(config.embedding_dim, 512);
    }
}
