use crate::error::{ChunkerError, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CHUNK_SIZE: usize = 120;
pub const DEFAULT_CHUNK_OVERLAP: usize = 15;

/// Configuration for word-window chunking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    /// Window size in words
    pub chunk_size: usize,

    /// Words shared between consecutive windows
    pub overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl ChunkerConfig {
    /// Number of words the window advances by. Never zero, even when
    /// `overlap >= chunk_size`.
    #[must_use]
    pub const fn step(&self) -> usize {
        let step = self.chunk_size.saturating_sub(self.overlap);
        if step == 0 {
            1
        } else {
            step
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(ChunkerError::invalid_config("chunk_size must be > 0"));
        }
        Ok(())
    }
}
