use crate::config::ChunkerConfig;
use crate::error::Result;

/// Word-window chunker
#[derive(Debug, Clone, Default)]
pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    /// Create a new chunker with configuration
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub const fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Split `text` into overlapping word windows
    #[must_use]
    pub fn chunk(&self, text: &str) -> Vec<String> {
        chunk_words(text, self.config.chunk_size, self.config.overlap)
    }
}

/// Split `text` into windows of `chunk_size` whitespace-delimited words,
/// advancing `max(1, chunk_size - overlap)` words per window.
///
/// Windows start at every step offset while words remain, so the final window
/// may be shorter than `chunk_size`. Windows that are blank after trimming are
/// dropped; empty input yields no chunks.
#[must_use]
pub fn chunk_words(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() || chunk_size == 0 {
        return Vec::new();
    }

    let step = chunk_size.saturating_sub(overlap).max(1);
    let mut chunks = Vec::with_capacity(words.len().div_ceil(step));
    for start in (0..words.len()).step_by(step) {
        let end = (start + chunk_size).min(words.len());
        let window = words[start..end].join(" ");
        let trimmed = window.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }
    }
    chunks
}
