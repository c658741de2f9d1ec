use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexerError>;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Chunker error: {0}")]
    ChunkerError(#[from] corpus_chunker::ChunkerError),

    #[error("Vector store error: {0}")]
    VectorStoreError(#[from] corpus_vector_store::VectorStoreError),

    #[error("Invalid document path: {0}")]
    InvalidPath(String),

    #[error("Index lock error: {0}")]
    Lock(String),
}
