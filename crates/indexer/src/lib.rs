//! # Corpus Indexer
//!
//! Builds and maintains a vector store from a directory of extracted text.
//!
//! ## Pipeline
//!
//! ```text
//! Directory
//!     │
//!     ├──> Document scanner (*.txt, sorted)
//!     │      └─> URL / Title / body
//!     │
//!     ├──> Chunker (word windows)
//!     │
//!     └──> Vector store (embed, index, save under index.lock)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use corpus_indexer::CorpusIndexer;
//! use corpus_vector_store::StoreConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StoreConfig::resolve(None).await?;
//!     let mut indexer = CorpusIndexer::new(&config)?;
//!     let stats = indexer.rebuild_from_dir("extracted_text").await?;
//!
//!     println!("Indexed {} documents, {} chunks", stats.documents, stats.chunks);
//!     Ok(())
//! }
//! ```

mod error;
mod index_lock;
mod indexer;
mod scanner;
mod stats;

pub use error::{IndexerError, Result};
pub use index_lock::{acquire_index_write_lock, IndexWriteLock};
pub use indexer::CorpusIndexer;
pub use scanner::{load_documents, scan_documents, LoadedDocuments, DOCUMENT_EXTENSION};
pub use stats::IndexStats;
