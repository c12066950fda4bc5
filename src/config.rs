//! Configuration loading and validation.

use crate::error::{ConfigError, Result};
use crate::vector::embedding::{DEFAULT_MOCK_DIMENSION, Embedder, MockEmbedder};
use crate::vector::memory_store::InMemoryStore;
use crate::vector::openai::{self, OpenAiEmbedder, OpenAiEmbedderConfig};
use crate::vector::pgvector::{self, PgVectorConfig, PgVectorStore};
use crate::vector::ranking::Metric;
use crate::vector::store::VectorStore;
use anyhow::Context as _;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "VECTOR_MEMORY_CONFIG";

/// Top-level configuration: named vector stores and embedders.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub vector_stores: Vec<StoreConfig>,
    pub embedders: Vec<EmbedderConfig>,
}

/// A named vector store definition.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub name: String,
    pub backend: StoreBackend,
}

#[derive(Debug, Clone)]
pub enum StoreBackend {
    Memory {
        /// Pins the accepted embedding dimension when set.
        dimension: Option<usize>,
    },
    PgVector(PgVectorConfig),
}

/// A named embedder definition.
#[derive(Debug, Clone)]
pub struct EmbedderConfig {
    pub name: String,
    pub backend: EmbedderBackend,
}

#[derive(Debug, Clone)]
pub enum EmbedderBackend {
    Mock {
        dimension: usize,
    },
    OpenAi {
        base_url: String,
        model: String,
        /// Environment variable holding the API key, read when the embedder is built.
        env_api_key: String,
        timeout: Duration,
    },
}

// -- TOML deserialization types --

#[derive(Deserialize, Default)]
struct TomlConfig {
    #[serde(default)]
    vector_stores: Vec<TomlStoreConfig>,
    #[serde(default)]
    embedders: Vec<TomlEmbedderConfig>,
}

#[derive(Deserialize)]
struct TomlStoreConfig {
    name: String,
    #[serde(default)]
    kind: String,
    dsn: Option<String>,
    table: Option<String>,
    dimension: Option<usize>,
    metric: Option<String>,
    max_connections: Option<u32>,
    acquire_timeout_secs: Option<u64>,
}

#[derive(Deserialize)]
struct TomlEmbedderConfig {
    name: String,
    #[serde(default)]
    kind: String,
    dimension: Option<usize>,
    base_url: Option<String>,
    model: Option<String>,
    #[serde(default = "default_env_api_key")]
    env_api_key: String,
    timeout_secs: Option<u64>,
}

fn default_env_api_key() -> String {
    "OPENAI_API_KEY".into()
}

/// Resolve a value that might be an "env:VAR_NAME" reference.
fn resolve_env_value(value: &str) -> Option<String> {
    if let Some(var_name) = value.strip_prefix("env:") {
        std::env::var(var_name).ok()
    } else {
        Some(value.to_string())
    }
}

fn ensure_unique<'a>(what: &str, names: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if name.is_empty() {
            return Err(ConfigError::Invalid(format!("{what} name must not be empty")).into());
        }
        if !seen.insert(name) {
            return Err(ConfigError::Invalid(format!("duplicate {what} name: {name}")).into());
        }
    }
    Ok(())
}

impl Config {
    /// Load from `$VECTOR_MEMORY_CONFIG`, else `<config dir>/vector-memory/config.toml`.
    ///
    /// A missing default file yields an empty configuration.
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Self::load_from_path(Path::new(&path));
        }

        let config_path = dirs::config_dir()
            .map(|d| d.join("vector-memory"))
            .unwrap_or_else(|| PathBuf::from("./.vector-memory"))
            .join("config.toml");

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "no config file, using empty configuration"
            );
            Ok(Self::default())
        }
    }

    /// Load from a specific TOML config file.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("failed to parse config from {}", path.display()))?;

        Self::from_toml(toml_config)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let toml_config: TomlConfig =
            toml::from_str(content).context("failed to parse config")?;
        Self::from_toml(toml_config)
    }

    fn from_toml(toml: TomlConfig) -> Result<Self> {
        ensure_unique("vector store", toml.vector_stores.iter().map(|s| s.name.as_str()))?;
        ensure_unique("embedder", toml.embedders.iter().map(|e| e.name.as_str()))?;

        let vector_stores = toml
            .vector_stores
            .into_iter()
            .map(Self::store_from_toml)
            .collect::<Result<Vec<_>>>()?;

        let embedders = toml
            .embedders
            .into_iter()
            .map(Self::embedder_from_toml)
            .collect::<Result<Vec<_>>>()?;

        Ok(Config {
            vector_stores,
            embedders,
        })
    }

    fn store_from_toml(s: TomlStoreConfig) -> Result<StoreConfig> {
        let backend = match s.kind.to_ascii_lowercase().as_str() {
            "" | "memory" => StoreBackend::Memory {
                dimension: s.dimension.filter(|d| *d > 0),
            },
            "pgvector" => {
                let dsn = s
                    .dsn
                    .as_deref()
                    .and_then(resolve_env_value)
                    .filter(|dsn| !dsn.is_empty())
                    .ok_or(ConfigError::MissingDsn)?;
                let dimension = s.dimension.unwrap_or(0);
                if dimension == 0 {
                    return Err(ConfigError::InvalidDimension(dimension).into());
                }
                let metric = s.metric.unwrap_or_default();
                metric.parse::<Metric>()?;

                StoreBackend::PgVector(PgVectorConfig {
                    dsn,
                    table: s.table.unwrap_or_else(|| pgvector::DEFAULT_TABLE.into()),
                    dimension,
                    metric,
                    max_connections: s
                        .max_connections
                        .unwrap_or(pgvector::DEFAULT_MAX_CONNECTIONS),
                    acquire_timeout: s
                        .acquire_timeout_secs
                        .map(Duration::from_secs)
                        .unwrap_or(pgvector::DEFAULT_ACQUIRE_TIMEOUT),
                })
            }
            other => {
                return Err(ConfigError::UnsupportedKind {
                    what: "vector store",
                    kind: other.to_string(),
                }
                .into());
            }
        };

        Ok(StoreConfig {
            name: s.name,
            backend,
        })
    }

    fn embedder_from_toml(e: TomlEmbedderConfig) -> Result<EmbedderConfig> {
        let backend = match e.kind.to_ascii_lowercase().as_str() {
            "" | "mock" => EmbedderBackend::Mock {
                dimension: e.dimension.unwrap_or(DEFAULT_MOCK_DIMENSION),
            },
            "openai" => EmbedderBackend::OpenAi {
                base_url: e
                    .base_url
                    .as_deref()
                    .and_then(resolve_env_value)
                    .unwrap_or_else(|| openai::DEFAULT_BASE_URL.into()),
                model: e.model.unwrap_or_else(|| openai::DEFAULT_MODEL.into()),
                env_api_key: e.env_api_key,
                timeout: e
                    .timeout_secs
                    .map(Duration::from_secs)
                    .unwrap_or(openai::DEFAULT_TIMEOUT),
            },
            other => {
                return Err(ConfigError::UnsupportedKind {
                    what: "embedder",
                    kind: other.to_string(),
                }
                .into());
            }
        };

        Ok(EmbedderConfig {
            name: e.name,
            backend,
        })
    }

    pub fn store(&self, name: &str) -> Option<&StoreConfig> {
        self.vector_stores.iter().find(|s| s.name == name)
    }

    pub fn embedder(&self, name: &str) -> Option<&EmbedderConfig> {
        self.embedders.iter().find(|e| e.name == name)
    }

    /// Construct the named vector store. pgvector stores connect eagerly.
    pub async fn build_store(&self, name: &str) -> Result<Box<dyn VectorStore>> {
        let store = self
            .store(name)
            .ok_or_else(|| ConfigError::UnknownStore(name.to_string()))?;
        store.build().await
    }

    /// Construct the named embedder.
    pub fn build_embedder(&self, name: &str) -> Result<Box<dyn Embedder>> {
        let embedder = self
            .embedder(name)
            .ok_or_else(|| ConfigError::UnknownEmbedder(name.to_string()))?;
        embedder.build()
    }
}

impl StoreConfig {
    pub async fn build(&self) -> Result<Box<dyn VectorStore>> {
        tracing::debug!(name = %self.name, "building vector store");
        match &self.backend {
            StoreBackend::Memory { dimension } => Ok(Box::new(match dimension {
                Some(dimension) => InMemoryStore::with_dimension(*dimension),
                None => InMemoryStore::new(),
            })),
            StoreBackend::PgVector(config) => Ok(Box::new(PgVectorStore::connect(config).await?)),
        }
    }
}

impl EmbedderConfig {
    pub fn build(&self) -> Result<Box<dyn Embedder>> {
        tracing::debug!(name = %self.name, "building embedder");
        match &self.backend {
            EmbedderBackend::Mock { dimension } => Ok(Box::new(MockEmbedder::new(*dimension))),
            EmbedderBackend::OpenAi {
                base_url,
                model,
                env_api_key,
                timeout,
            } => {
                let api_key = std::env::var(env_api_key)
                    .ok()
                    .filter(|key| !key.is_empty())
                    .ok_or_else(|| ConfigError::MissingApiKey {
                        env: env_api_key.clone(),
                    })?;
                Ok(Box::new(OpenAiEmbedder::new(OpenAiEmbedderConfig {
                    base_url: base_url.clone(),
                    api_key,
                    model: model.clone(),
                    timeout: *timeout,
                })?))
            }
        }
    }
}
