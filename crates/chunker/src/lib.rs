//! # Corpus Chunker
//!
//! Word-window chunking for document embedding.
//!
//! A document is split on whitespace into words, then cut into windows of
//! `chunk_size` words. Consecutive windows share `overlap` words so that a
//! sentence straddling a boundary is still retrievable from either side.
//!
//! ```text
//! words:   w0 w1 w2 w3 w4 w5 w6 w7 w8
//! size=4, overlap=1  (step = 3)
//!          [w0 w1 w2 w3]
//!                   [w3 w4 w5 w6]
//!                            [w6 w7 w8]
//! ```
//!
//! ## Example
//!
//! ```rust
//! use corpus_chunker::{Chunker, ChunkerConfig};
//!
//! let chunker = Chunker::new(ChunkerConfig { chunk_size: 4, overlap: 1 }).unwrap();
//! let chunks = chunker.chunk("one two three four five six");
//! assert_eq!(chunks, vec!["one two three four", "four five six"]);
//! ```

mod chunker;
mod config;
mod error;

pub use chunker::{chunk_words, Chunker};
pub use config::{ChunkerConfig, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
pub use error::{ChunkerError, Result};
