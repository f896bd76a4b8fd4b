use clap::ValueEnum;
use docqa_chunker::ChunkerConfig;
use docqa_vector_store::{EmbeddingClientConfig, RetryPolicy, DEFAULT_BASE_URL, DEFAULT_DIMENSION, DEFAULT_MODEL};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "docqa.toml";

/// File name used when a snapshot location names a directory
pub const SNAPSHOT_FILE_NAME: &str = "vector_store.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value '{value}' for {name}: {reason}")]
    InvalidValue {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EmbedMode {
    /// OpenAI-compatible HTTP embeddings endpoint
    Openai,
    /// Deterministic offline hash vectors
    Stub,
}

impl EmbedMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Openai => "openai",
            Self::Stub => "stub",
        }
    }
}

/// Retry settings as they appear in config files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            base_delay_ms: u64::try_from(policy.base_delay.as_millis()).unwrap_or(u64::MAX),
            max_delay_ms: u64::try_from(policy.max_delay.as_millis()).unwrap_or(u64::MAX),
            jitter: policy.jitter,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub mode: EmbedMode,
    pub model: String,
    pub dimension: usize,
    pub base_url: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub batch_size: usize,
    pub concurrency: usize,
    pub timeout_secs: u64,
    pub retry: RetrySettings,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        let client = EmbeddingClientConfig::default();
        Self {
            mode: EmbedMode::Openai,
            model: DEFAULT_MODEL.to_string(),
            dimension: DEFAULT_DIMENSION,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            batch_size: client.max_batch_size,
            concurrency: client.concurrency,
            timeout_secs: client.request_timeout.as_secs(),
            retry: RetrySettings::default(),
        }
    }
}

impl EmbeddingSettings {
    #[must_use]
    pub fn client_config(&self) -> EmbeddingClientConfig {
        EmbeddingClientConfig {
            max_batch_size: self.batch_size,
            concurrency: self.concurrency,
            request_timeout: Duration::from_secs(self.timeout_secs),
        }
    }

    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            base_delay: Duration::from_millis(self.retry.base_delay_ms),
            max_delay: Duration::from_millis(self.retry.max_delay_ms),
            jitter: self.retry.jitter,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub snapshot_path: PathBuf,
    /// Documents chunked at once; defaults to available parallelism clamped to 2..=8
    pub chunk_concurrency: Option<usize>,
    /// Results returned by `search` when `-k` is not given
    pub default_k: usize,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from("./vector_db").join(SNAPSHOT_FILE_NAME),
            chunk_concurrency: None,
            default_k: 5,
        }
    }
}

/// Complete application configuration.
///
/// Layers, later wins: defaults, TOML file, environment, command-line flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocqaConfig {
    pub docs_dir: PathBuf,
    pub chunker: ChunkerConfig,
    pub embedding: EmbeddingSettings,
    pub index: IndexSettings,
}

impl Default for DocqaConfig {
    fn default() -> Self {
        Self {
            docs_dir: PathBuf::from("./docs"),
            chunker: ChunkerConfig::default(),
            embedding: EmbeddingSettings::default(),
            index: IndexSettings::default(),
        }
    }
}

impl DocqaConfig {
    /// Load defaults, then `explicit` (or `docqa.toml` if present), then the
    /// process environment
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(DEFAULT_CONFIG_FILE)?
            }
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overlay environment variables. Each setting reads its `DOCQA_*` name
    /// first and the legacy name second.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let first = |names: &[&str]| {
            names.iter().find_map(|name| {
                lookup(name)
                    .filter(|value| !value.trim().is_empty())
                    .map(|value| ((*name).to_string(), value))
            })
        };

        if let Some((_, dir)) = first(&["DOCQA_DOCS_DIR", "DOCS_DIR"]) {
            self.docs_dir = PathBuf::from(dir);
        }

        if let Some((_, path)) = first(&["DOCQA_SNAPSHOT_PATH"]) {
            self.index.snapshot_path = PathBuf::from(path);
        } else if let Some((_, dir)) = first(&["VECTOR_DB_PATH"]) {
            self.index.snapshot_path = snapshot_location(&dir);
        }

        if let Some((_, model)) = first(&["DOCQA_EMBEDDING_MODEL", "EMBEDDING_MODEL"]) {
            self.embedding.model = model;
        }

        if let Some((name, raw)) = first(&["DOCQA_EMBEDDING_DIMENSION"]) {
            self.embedding.dimension =
                raw.trim()
                    .parse()
                    .map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
                        name,
                        value: raw.clone(),
                        reason: e.to_string(),
                    })?;
        }

        if let Some((name, raw)) = first(&["DOCQA_EMBEDDING_MODE"]) {
            self.embedding.mode = EmbedMode::from_str(raw.trim(), true).map_err(|_| {
                ConfigError::InvalidValue {
                    name,
                    value: raw.clone(),
                    reason: "expected 'openai' or 'stub'".to_string(),
                }
            })?;
        }

        if let Some((_, url)) = first(&["DOCQA_EMBEDDING_BASE_URL", "OPENAI_BASE_URL"]) {
            self.embedding.base_url = url;
        }

        if let Some((_, key)) = first(&["DOCQA_API_KEY", "OPENAI_API_KEY"]) {
            self.embedding.api_key = Some(key);
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.chunker
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("[chunker] {e}")))?;

        let embedding = &self.embedding;
        let checks = [
            (embedding.dimension == 0, "embedding.dimension must be > 0"),
            (embedding.batch_size == 0, "embedding.batch_size must be > 0"),
            (embedding.concurrency == 0, "embedding.concurrency must be > 0"),
            (embedding.timeout_secs == 0, "embedding.timeout_secs must be > 0"),
            (
                embedding.retry.max_attempts == 0,
                "embedding.retry.max_attempts must be > 0",
            ),
            (
                !(0.0..=1.0).contains(&embedding.retry.jitter),
                "embedding.retry.jitter must be within [0, 1]",
            ),
            (
                embedding.model.trim().is_empty(),
                "embedding.model must not be empty",
            ),
            (
                self.index.chunk_concurrency == Some(0),
                "index.chunk_concurrency must be > 0",
            ),
            (self.index.default_k == 0, "index.default_k must be > 0"),
        ];
        if let Some((_, message)) = checks.iter().find(|(failed, _)| *failed) {
            return Err(ConfigError::Invalid((*message).to_string()));
        }

        Ok(())
    }
}

/// A `.json` path is taken as the snapshot file, anything else as its directory
fn snapshot_location(raw: &str) -> PathBuf {
    let path = PathBuf::from(raw);
    if path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
    {
        path
    } else {
        path.join(SNAPSHOT_FILE_NAME)
    }
}
