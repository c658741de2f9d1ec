use serde::{Deserialize, Serialize};

/// Store-wide chunk identifier. Assigned from a monotonic counter and never
/// reused, even after the owning document is replaced.
pub type ChunkId = u64;

/// One embedded word window together with its provenance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub id: ChunkId,
    pub url: String,
    pub title: String,
    pub chunk_text: String,
    pub source_file: String,
}

impl ChunkRecord {
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.chunk_text.split_whitespace().count()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub chunk: ChunkRecord,
    /// Squared Euclidean distance reported by the index
    pub distance: f32,
    /// `1 / (1 + distance)`, in (0, 1]
    pub similarity: f32,
}

/// Maps a non-negative distance to a similarity in (0, 1].
#[must_use]
pub fn similarity_from_distance(distance: f32) -> f32 {
    1.0 / (1.0 + distance.max(0.0))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_chunks: usize,
    pub unique_documents: usize,
    pub total_words: usize,
    pub average_chunk_length: f64,
    pub next_chunk_id: ChunkId,
    pub embedding_dimension: usize,
    pub model_name: String,
    pub degraded: bool,
}

/// What a successful `update_document` changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateOutcome {
    pub source_file: String,
    pub removed_ids: Vec<ChunkId>,
    pub added_ids: Vec<ChunkId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RebuildSummary {
    pub documents: usize,
    pub chunks: usize,
}
