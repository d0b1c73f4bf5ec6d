use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ArgoConfig {
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
    pub embedding: EmbeddingConfig,
    pub ingest: IngestConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// `"tfidf"` (vocabulary frozen on first document) or `"hashing"`.
    pub strategy: String,
    pub dimensions: usize,
    pub index_path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct IngestConfig {
    pub file_extension: String,
    pub query_limit: usize,
    pub default_top_k: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_argo_dir()
            .join("argo.db")
            .to_string_lossy()
            .into_owned();
        Self { db_path }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        let index_path = default_argo_dir()
            .join("vector_store.json")
            .to_string_lossy()
            .into_owned();
        Self {
            strategy: "tfidf".into(),
            dimensions: 1000,
            index_path,
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            file_extension: "nc".into(),
            query_limit: 1000,
            default_top_k: 5,
        }
    }
}

/// Returns `~/.argo-ingest/`, or `./.argo-ingest/` when no home directory is known.
pub fn default_argo_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".argo-ingest")
}

/// Returns the default config file path: `~/.argo-ingest/config.toml`
pub fn default_config_path() -> PathBuf {
    default_argo_dir().join("config.toml")
}

impl ArgoConfig {
    /// Load config from the default TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            ArgoConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (ARGO_DB, ARGO_INDEX, ARGO_LOG_LEVEL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("ARGO_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("ARGO_INDEX") {
            self.embedding.index_path = val;
        }
        if let Ok(val) = std::env::var("ARGO_LOG_LEVEL") {
            self.logging.level = val;
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }

    /// Resolve the persisted embedding index path, expanding `~` if needed.
    pub fn resolved_index_path(&self) -> PathBuf {
        expand_tilde(&self.embedding.index_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
