//! Project configuration: root, data directory, embedding model, chunk
//! budget, and ignore patterns.
//!
//! The on-disk form lives at `<dataDir>/config.json`. Defaults are sane for a
//! fresh project; environment variables can override individual fields the
//! way `GRAPH_*` variables override `codegraph-prep`'s config.

use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

pub const DEFAULT_DATA_DIR_NAME: &str = ".repo-knowledge";
pub const DEFAULT_EMBEDDING_MODEL: &str = "Xenova/all-MiniLM-L6-v2";
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 384;
pub const DEFAULT_CHUNK_MAX_TOKENS: usize = 512;
pub const CONFIG_SCHEMA_VERSION: u32 = 1;
pub const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error reading/writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid configuration: {0}")]
    Validation(String),
}

/// Project-level configuration, persisted as `config.json` under the data
/// directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoKnowledgeConfig {
    pub project_root: PathBuf,
    pub data_dir: PathBuf,
    pub embedding_model: String,
    pub embedding_dimensions: usize,
    #[serde(default = "default_chunk_max_tokens")]
    pub chunk_max_tokens: usize,
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,
    #[serde(default = "default_version")]
    pub version: u32,
}

fn default_chunk_max_tokens() -> usize {
    DEFAULT_CHUNK_MAX_TOKENS
}

fn default_version() -> u32 {
    CONFIG_SCHEMA_VERSION
}

/// Patterns excluded from discovery regardless of the project's own
/// `ignorePatterns`. Mirrors `codegraph-prep`'s default `Filters::ignore_globs`,
/// extended with the data directory itself and common lockfile/artifact noise.
pub fn default_ignore_patterns() -> Vec<String> {
    vec![
        "**/.git/**".to_string(),
        "**/node_modules/**".to_string(),
        "**/target/**".to_string(),
        "**/build/**".to_string(),
        "**/dist/**".to_string(),
        "**/.repo-knowledge/**".to_string(),
        "**/.venv/**".to_string(),
        "**/__pycache__/**".to_string(),
    ]
}

impl RepoKnowledgeConfig {
    /// Build the default configuration for a project rooted at `project_root`.
    pub fn default_for(project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        let data_dir = project_root.join(DEFAULT_DATA_DIR_NAME);
        Self {
            project_root,
            data_dir,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
            chunk_max_tokens: DEFAULT_CHUNK_MAX_TOKENS,
            ignore_patterns: default_ignore_patterns(),
            version: CONFIG_SCHEMA_VERSION,
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE_NAME)
    }

    /// Load `config.json` from `project_root`'s data directory if present;
    /// otherwise materialize and persist the default configuration.
    pub fn load_or_init(project_root: &Path) -> Result<Self, ConfigError> {
        let mut cfg = Self::default_for(project_root);
        let path = cfg.config_path();
        if path.exists() {
            cfg = Self::load(&path)?;
        } else {
            fs::create_dir_all(&cfg.data_dir).map_err(|source| ConfigError::Io {
                path: cfg.data_dir.clone(),
                source,
            })?;
            cfg.save()?;
        }
        cfg.apply_env_overrides();
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg: RepoKnowledgeConfig =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(cfg)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let path = self.config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let text = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, text).map_err(|source| ConfigError::Io { path, source })
    }

    /// Recognized overrides (all optional): `REPO_KNOWLEDGE_EMBEDDING_MODEL`,
    /// `REPO_KNOWLEDGE_EMBEDDING_DIMENSIONS`, `REPO_KNOWLEDGE_CHUNK_MAX_TOKENS`,
    /// `REPO_KNOWLEDGE_IGNORE_PATTERNS` (comma-separated).
    pub fn apply_env_overrides(&mut self) {
        if let Ok(model) = env::var("REPO_KNOWLEDGE_EMBEDDING_MODEL") {
            if !model.trim().is_empty() {
                self.embedding_model = model;
            }
        }
        if let Some(dims) = env_usize("REPO_KNOWLEDGE_EMBEDDING_DIMENSIONS") {
            self.embedding_dimensions = dims;
        }
        if let Some(tokens) = env_usize("REPO_KNOWLEDGE_CHUNK_MAX_TOKENS") {
            self.chunk_max_tokens = tokens;
        }
        if let Ok(raw) = env::var("REPO_KNOWLEDGE_IGNORE_PATTERNS") {
            let patterns: Vec<String> = raw
                .split(',')
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            if !patterns.is_empty() {
                self.ignore_patterns = patterns;
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.embedding_dimensions == 0 {
            return Err(ConfigError::Validation(
                "embeddingDimensions must be greater than 0".to_string(),
            ));
        }
        if self.chunk_max_tokens == 0 {
            return Err(ConfigError::Validation(
                "chunkMaxTokens must be greater than 0".to_string(),
            ));
        }
        if self.embedding_model.trim().is_empty() {
            return Err(ConfigError::Validation(
                "embeddingModel must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn metadata_db_path(&self) -> PathBuf {
        self.data_dir.join("metadata.db")
    }

    pub fn vectors_dir(&self) -> PathBuf {
        self.data_dir.join("vectors")
    }
}

fn env_usize(key: &str) -> Option<usize> {
    env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_for_sets_expected_defaults() {
        let cfg = RepoKnowledgeConfig::default_for("/repo");
        assert_eq!(cfg.embedding_model, DEFAULT_EMBEDDING_MODEL);
        assert_eq!(cfg.embedding_dimensions, DEFAULT_EMBEDDING_DIMENSIONS);
        assert_eq!(cfg.chunk_max_tokens, DEFAULT_CHUNK_MAX_TOKENS);
        assert_eq!(cfg.data_dir, PathBuf::from("/repo/.repo-knowledge"));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn load_or_init_persists_defaults_then_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        let first = RepoKnowledgeConfig::load_or_init(root).unwrap();
        assert!(first.config_path().exists());

        let second = RepoKnowledgeConfig::load_or_init(root).unwrap();
        assert_eq!(first.embedding_model, second.embedding_model);
        assert_eq!(first.embedding_dimensions, second.embedding_dimensions);
    }

    #[test]
    fn round_trip_through_json_matches_schema_keys() {
        let cfg = RepoKnowledgeConfig::default_for("/repo");
        let json = serde_json::to_value(&cfg).unwrap();
        for key in [
            "projectRoot",
            "dataDir",
            "embeddingModel",
            "embeddingDimensions",
            "chunkMaxTokens",
            "ignorePatterns",
            "version",
        ] {
            assert!(json.get(key).is_some(), "missing key {key}");
        }
    }

    #[test]
    fn validate_rejects_zero_dimensions() {
        let mut cfg = RepoKnowledgeConfig::default_for("/repo");
        cfg.embedding_dimensions = 0;
        assert!(cfg.validate().is_err());
    }
}
