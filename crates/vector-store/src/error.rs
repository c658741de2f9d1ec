use thiserror::Error;

pub type Result<T> = std::result::Result<T, VectorStoreError>;

#[derive(Error, Debug)]
pub enum VectorStoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Malformed document {path}: {reason}")]
    MalformedDocument { path: String, reason: String },

    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    #[error("No embedding provider configured")]
    ProviderUnavailable,

    #[error("Index error: {0}")]
    IndexError(String),

    #[error("Chunk id {0} is already indexed")]
    DuplicateId(u64),

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Inconsistent store: {0}")]
    Inconsistent(String),

    #[error("Store was built with model '{stored}', but the provider is '{configured}'")]
    ModelMismatch { stored: String, configured: String },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Chunker error: {0}")]
    ChunkerError(#[from] corpus_chunker::ChunkerError),
}
