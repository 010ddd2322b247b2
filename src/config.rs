//! Configuration loaded from YAML with environment overrides

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::schema::DEFAULT_NEIGHBORHOODS;
use crate::search::retriever::DEFAULT_POOL_SIZE;

/// Looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "imobiliar.yaml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub filters: FilterConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite file holding catalog rows and embeddings
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from(".imobiliar/index.db")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Candidates fetched before reranking, independent of k
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    #[serde(default = "default_k")]
    pub default_k: usize,
    /// Upper bound applied to k requested from the CLI or MCP
    #[serde(default = "default_max_k")]
    pub max_k: usize,
}

fn default_pool_size() -> usize {
    DEFAULT_POOL_SIZE
}

fn default_k() -> usize {
    10
}

fn default_max_k() -> usize {
    20
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            pool_size: default_pool_size(),
            default_k: default_k(),
            max_k: default_max_k(),
        }
    }
}

impl RetrievalConfig {
    pub fn clamp_k(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.default_k).min(self.max_k)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Neighborhood gazetteer, matched in order
    #[serde(default = "default_neighborhoods")]
    pub neighborhoods: Vec<String>,
}

fn default_neighborhoods() -> Vec<String> {
    DEFAULT_NEIGHBORHOODS.iter().map(|s| s.to_string()).collect()
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            neighborhoods: default_neighborhoods(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Comparables snapshot written after each query; `null` disables it
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: Option<PathBuf>,
}

fn default_snapshot_path() -> Option<PathBuf> {
    Some(PathBuf::from(".imobiliar/comparables.json"))
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
        }
    }
}

impl Config {
    /// Load from `path`, else `./imobiliar.yaml` if present, else defaults.
    /// Environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(p) => Self::from_file(p)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        Ok(config.with_env_overrides())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// IMOBILIAR_DB, IMOBILIAR_POOL_SIZE and IMOBILIAR_SNAPSHOT take
    /// precedence over file values. An empty IMOBILIAR_SNAPSHOT disables
    /// the snapshot.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("IMOBILIAR_DB") {
            if !val.is_empty() {
                self.storage.db_path = PathBuf::from(val);
            }
        }
        if let Ok(val) = std::env::var("IMOBILIAR_POOL_SIZE") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => self.retrieval.pool_size = n,
                _ => tracing::warn!(value = %val, "ignoring invalid IMOBILIAR_POOL_SIZE"),
            }
        }
        if let Ok(val) = std::env::var("IMOBILIAR_SNAPSHOT") {
            self.output.snapshot_path = if val.is_empty() {
                None
            } else {
                Some(PathBuf::from(val))
            };
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.retrieval.pool_size, 50);
        assert_eq!(config.retrieval.default_k, 10);
        assert_eq!(config.filters.neighborhoods.len(), DEFAULT_NEIGHBORHOODS.len());
        assert!(config.output.snapshot_path.is_some());
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = r#"
retrieval:
  pool_size: 80
filters:
  neighborhoods: [floreasca, titan]
output:
  snapshot_path: null
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.retrieval.pool_size, 80);
        assert_eq!(config.retrieval.max_k, 20);
        assert_eq!(config.filters.neighborhoods, vec!["floreasca", "titan"]);
        assert!(config.output.snapshot_path.is_none());
        assert_eq!(config.storage.db_path, PathBuf::from(".imobiliar/index.db"));
    }

    #[test]
    fn test_clamp_k() {
        let retrieval = RetrievalConfig::default();
        assert_eq!(retrieval.clamp_k(None), 10);
        assert_eq!(retrieval.clamp_k(Some(3)), 3);
        assert_eq!(retrieval.clamp_k(Some(500)), 20);
        assert_eq!(retrieval.clamp_k(Some(0)), 0);
    }

    #[test]
    fn test_from_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("imobiliar.yaml");
        std::fs::write(&path, "storage:\n  db_path: /tmp/props.db\n")?;

        let config = Config::from_file(&path)?;
        assert_eq!(config.storage.db_path, PathBuf::from("/tmp/props.db"));
        assert!(Config::from_file(&dir.path().join("missing.yaml")).is_err());
        Ok(())
    }
}
