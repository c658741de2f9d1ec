//! # Corpus Vector Store
//!
//! Incremental semantic index over a corpus of extracted text documents.
//!
//! ## Features
//!
//! - **Word-window chunking** with configurable overlap
//! - **Pluggable embeddings**: ONNX sentence-transformers, or an explicitly
//!   degraded stub for tests
//! - **Exact k-NN** over squared Euclidean distance
//! - **Per-document updates** that replace a file's chunks without touching
//!   the rest of the corpus; chunk ids are never reused
//! - **Checksummed persistence** that detects interrupted saves
//!
//! ## Architecture
//!
//! ```text
//! Document
//!     │
//!     ├──> Chunker (word windows)
//!     │
//!     ├──> EmbeddingProvider
//!     │      └─> Vector[D]
//!     │
//!     ├──> VectorIndex  (id -> vector)
//!     ├──> ChunkStore   (id -> chunk record)
//!     ├──> DocumentManifest (source file -> ids)
//!     │
//!     └──> Persistence
//!            └─> index.bin, chunks.json, manifest.json, store_info.json
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use corpus_chunker::Chunker;
//! use corpus_vector_store::{provider_from_config, StoreConfig, VectorStoreManager};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = StoreConfig::resolve(None).await?;
//!     let provider = provider_from_config(&config)?;
//!     let chunker = Chunker::new(config.chunker_config())?;
//!     let mut store = VectorStoreManager::new(&config.storage_dir, chunker, provider);
//!     store.load().await?;
//!
//!     store.update_document("extracted_text/admissions.txt").await?;
//!
//!     for hit in store.search("hostel fee structure", 5).await? {
//!         println!("{:.3} {}", hit.similarity, hit.chunk.title);
//!     }
//!     Ok(())
//! }
//! ```

mod chunk_store;
mod config;
mod document;
mod embeddings;
mod error;
mod index;
mod manager;
mod manifest;
mod persistence;
mod types;

pub use chunk_store::ChunkStore;
pub use config::{
    EmbeddingMode, StoreConfig, DEFAULT_MODEL_DIR, DEFAULT_MODEL_NAME, DEFAULT_STORE_DIR,
    ENV_EMBEDDING_MODE, ENV_EMBED_MODEL, ENV_MODEL_DIR, ENV_STORE_DIR,
};
pub use document::{load_document, parse_document, source_key, Document};
pub use embeddings::{provider_from_config, EmbeddingProvider, OnnxEmbedder, StubEmbedder};
pub use error::{Result, VectorStoreError};
pub use index::{FlatIndex, VectorIndex};
pub use manager::{LoadOutcome, VectorStoreManager};
pub use manifest::DocumentManifest;
pub use persistence::{
    load_store, recover_interrupted_save, save_store, LoadedArtifacts, SaveRecovery, StoreLayout,
    StoreMetadata, StoreSnapshot,
    CHUNKS_FILE_NAME, INDEX_FILE_NAME, LOCK_FILE_NAME, MANIFEST_FILE_NAME, METADATA_FILE_NAME,
};
pub use types::{
    similarity_from_distance, ChunkId, ChunkRecord, RebuildSummary, SearchHit, StoreStats,
    UpdateOutcome,
};

// Re-export chunker types for convenience
pub use corpus_chunker::{Chunker, ChunkerConfig};
