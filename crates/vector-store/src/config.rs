use crate::error::{Result, VectorStoreError};
use corpus_chunker::{ChunkerConfig, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

pub const DEFAULT_STORE_DIR: &str = "vector_store";
pub const DEFAULT_MODEL_NAME: &str = "all-MiniLM-L6-v2";
pub const DEFAULT_MODEL_DIR: &str = "models";

pub const ENV_STORE_DIR: &str = "CORPUS_STORE_DIR";
pub const ENV_EMBED_MODEL: &str = "CORPUS_EMBED_MODEL";
pub const ENV_EMBEDDING_MODE: &str = "CORPUS_EMBEDDING_MODE";
pub const ENV_MODEL_DIR: &str = "CORPUS_MODEL_DIR";

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingMode {
    /// Sentence-transformer model on ONNX Runtime
    #[default]
    Onnx,
    /// Deterministic hash vectors with no semantic meaning
    Stub,
}

impl EmbeddingMode {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "onnx" | "fast" => Ok(Self::Onnx),
            "stub" => Ok(Self::Stub),
            other => Err(VectorStoreError::Config(format!(
                "Unsupported embedding mode '{other}' (expected 'onnx' or 'stub')"
            ))),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Onnx => "onnx",
            Self::Stub => "stub",
        }
    }
}

/// Settings for one vector store instance.
///
/// Resolution order: built-in defaults, then an optional TOML file, then
/// `CORPUS_*` environment variables, then explicit CLI flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub storage_dir: PathBuf,
    pub model_name: String,
    pub model_dir: PathBuf,
    pub embedding_mode: EmbeddingMode,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(DEFAULT_STORE_DIR),
            model_name: DEFAULT_MODEL_NAME.to_string(),
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            embedding_mode: EmbeddingMode::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl StoreConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|err| VectorStoreError::Config(format!("{err}")))
    }

    pub async fn from_toml_file(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|err| {
            VectorStoreError::Config(format!("read config {}: {err}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Defaults or `path`, with environment overrides applied.
    pub async fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_toml_file(path).await?,
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) -> Result<()> {
        if let Some(dir) = non_empty_env(ENV_STORE_DIR) {
            self.storage_dir = PathBuf::from(dir);
        }
        if let Some(model) = non_empty_env(ENV_EMBED_MODEL) {
            self.model_name = model;
        }
        if let Some(dir) = non_empty_env(ENV_MODEL_DIR) {
            self.model_dir = PathBuf::from(dir);
        }
        if let Some(mode) = non_empty_env(ENV_EMBEDDING_MODE) {
            self.embedding_mode = EmbeddingMode::parse(&mode)?;
        }
        Ok(())
    }

    #[must_use]
    pub const fn chunker_config(&self) -> ChunkerConfig {
        ChunkerConfig {
            chunk_size: self.chunk_size,
            overlap: self.chunk_overlap,
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
