use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::embedding::{EmbeddingModel, ProviderKind};
use super::index::{IndexConfig, Metric, ServerlessSpec};
use crate::error::ConfigError;
use crate::utils::RetryConfig;

pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_PINECONE_URL: &str = "https://api.pinecone.io";
pub const DEFAULT_INDEX_NAME: &str = "axionrag";
pub const DEFAULT_NAMESPACE: &str = "arag";
pub const DEFAULT_SOURCE: &str = "data/reviews.json";

pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const PINECONE_API_KEY_ENV: &str = "PINECONE_API_KEY";

/// Largest batch the index service accepts in one upsert call.
pub const MAX_UPSERT_BATCH: usize = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub index: IndexSettings,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            embedding: EmbeddingConfig::default(),
            index: IndexSettings::default(),
            ingest: IngestConfig::default(),
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("review-ingest").join("config.toml"))
    }

    /// Load the global config file, falling back to defaults when it does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load an explicit config file. A missing file is an error.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.index.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "index.name must not be empty".to_string(),
            ));
        }
        if self.index.namespace.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "index.namespace must not be empty".to_string(),
            ));
        }
        if !(1..=MAX_UPSERT_BATCH).contains(&self.index.upsert_batch_size) {
            return Err(ConfigError::ValidationError(format!(
                "index.upsert_batch_size must be between 1 and {}",
                MAX_UPSERT_BATCH
            )));
        }
        if self.embedding.model.provider() != self.embedding.provider {
            return Err(ConfigError::ValidationError(format!(
                "model {} is not served by provider {}",
                self.embedding.model, self.embedding.provider
            )));
        }
        if self.ingest.burst == 0 {
            return Err(ConfigError::ValidationError(
                "ingest.burst must be at least 1".to_string(),
            ));
        }
        if self.ingest.max_retries == 0 {
            return Err(ConfigError::ValidationError(
                "ingest.max_retries must be at least 1".to_string(),
            ));
        }
        if let Some(dimensions) = self.embedding.dimensions {
            if dimensions == 0 {
                return Err(ConfigError::ValidationError(
                    "embedding.dimensions must be greater than 0".to_string(),
                ));
            }
            if dimensions != self.embedding.model.native_dimension()
                && !self.embedding.model.supports_dimension_override()
            {
                return Err(ConfigError::ValidationError(format!(
                    "model {} only produces {}-dimensional vectors",
                    self.embedding.model,
                    self.embedding.model.native_dimension()
                )));
            }
        }
        if self.index.dimension == Some(0) {
            return Err(ConfigError::ValidationError(
                "index.dimension must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve the index definition for this run.
    pub fn index_config(&self) -> IndexConfig {
        IndexConfig {
            name: self.index.name.clone(),
            dimension: self
                .index
                .dimension
                .unwrap_or_else(|| self.embedding.output_dimension()),
            metric: self.index.metric,
            spec: ServerlessSpec {
                cloud: self.index.cloud.clone(),
                region: self.index.region.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: ProviderKind,

    #[serde(default)]
    pub model: EmbeddingModel,

    #[serde(default = "default_openai_url")]
    pub base_url: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Requested output length; the model's native length when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<usize>,
}

impl EmbeddingConfig {
    pub fn output_dimension(&self) -> usize {
        self.dimensions
            .unwrap_or_else(|| self.model.native_dimension())
    }
}

fn default_openai_url() -> String {
    DEFAULT_OPENAI_URL.to_string()
}

fn default_timeout() -> u64 {
    60
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            model: EmbeddingModel::default(),
            base_url: default_openai_url(),
            timeout_secs: default_timeout(),
            dimensions: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSettings {
    #[serde(default = "default_index_name")]
    pub name: String,

    /// Declared index dimension; follows the embedding output length when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<usize>,

    #[serde(default)]
    pub metric: Metric,

    #[serde(default = "default_cloud")]
    pub cloud: String,

    #[serde(default = "default_region")]
    pub region: String,

    #[serde(default = "default_namespace")]
    pub namespace: String,

    #[serde(default = "default_control_url")]
    pub control_url: String,

    #[serde(default = "default_upsert_batch_size")]
    pub upsert_batch_size: usize,

    #[serde(default = "default_ready_timeout")]
    pub ready_timeout_secs: u64,
}

fn default_index_name() -> String {
    DEFAULT_INDEX_NAME.to_string()
}

fn default_cloud() -> String {
    ServerlessSpec::default().cloud
}

fn default_region() -> String {
    ServerlessSpec::default().region
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_control_url() -> String {
    DEFAULT_PINECONE_URL.to_string()
}

fn default_upsert_batch_size() -> usize {
    100
}

fn default_ready_timeout() -> u64 {
    120
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            name: default_index_name(),
            dimension: None,
            metric: Metric::default(),
            cloud: default_cloud(),
            region: default_region(),
            namespace: default_namespace(),
            control_url: default_control_url(),
            upsert_batch_size: default_upsert_batch_size(),
            ready_timeout_secs: default_ready_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_source")]
    pub source: PathBuf,

    /// Minimum spacing between embedding requests.
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,

    /// Requests allowed back to back before pacing kicks in.
    #[serde(default = "default_burst")]
    pub burst: u32,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_initial_delay_ms")]
    pub retry_initial_delay_ms: u64,

    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

impl IngestConfig {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::new(self.max_retries)
            .with_initial_delay(Duration::from_millis(self.retry_initial_delay_ms))
            .with_max_delay(Duration::from_millis(self.retry_max_delay_ms))
    }
}

fn default_source() -> PathBuf {
    PathBuf::from(DEFAULT_SOURCE)
}

fn default_min_interval_ms() -> u64 {
    5000
}

fn default_burst() -> u32 {
    1
}

fn default_max_retries() -> u32 {
    5
}

fn default_retry_initial_delay_ms() -> u64 {
    1000
}

fn default_retry_max_delay_ms() -> u64 {
    60_000
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            min_interval_ms: default_min_interval_ms(),
            burst: default_burst(),
            max_retries: default_max_retries(),
            retry_initial_delay_ms: default_retry_initial_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

/// API keys, sourced from the environment only.
#[derive(Clone)]
pub struct Secrets {
    pub embedding_api_key: String,
    pub index_api_key: String,
}

impl Secrets {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            embedding_api_key: require_env(OPENAI_API_KEY_ENV)?,
            index_api_key: require_env(PINECONE_API_KEY_ENV)?,
        })
    }

    /// Only the index key, for commands that never embed.
    pub fn index_key_from_env() -> Result<String, ConfigError> {
        require_env(PINECONE_API_KEY_ENV)
    }
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("embedding_api_key", &mask(&self.embedding_api_key))
            .field("index_api_key", &mask(&self.index_api_key))
            .finish()
    }
}

fn require_env(name: &'static str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingSecret(name)),
    }
}

/// Mask a secret for display, keeping the last four characters.
pub fn mask(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 4 {
        return "****".to_string();
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("****{}", tail)
}
