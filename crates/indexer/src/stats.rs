use serde::{Deserialize, Serialize};

/// Statistics about one indexing operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of documents indexed
    pub documents: usize,

    /// Number of chunks created
    pub chunks: usize,

    /// Documents that could not be read, one message each
    pub errors: Vec<String>,

    /// Time taken in milliseconds
    pub time_ms: u64,
}

impl IndexStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_document(&mut self, chunks: usize) {
        self.documents += 1;
        self.chunks += chunks;
    }

    pub fn add_error(&mut self, error: String) {
        self.errors.push(error);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
