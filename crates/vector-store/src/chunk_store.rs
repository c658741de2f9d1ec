use crate::types::{ChunkId, ChunkRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Chunk records by id. Serializes as a JSON object keyed by the stringified
/// id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkStore {
    chunks: BTreeMap<ChunkId, ChunkRecord>,
}

impl ChunkStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, record: ChunkRecord) -> Option<ChunkRecord> {
        self.chunks.insert(record.id, record)
    }

    #[must_use]
    pub fn get(&self, id: ChunkId) -> Option<&ChunkRecord> {
        self.chunks.get(&id)
    }

    pub fn remove(&mut self, id: ChunkId) -> Option<ChunkRecord> {
        self.chunks.remove(&id)
    }

    #[must_use]
    pub fn contains(&self, id: ChunkId) -> bool {
        self.chunks.contains_key(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = ChunkId> + '_ {
        self.chunks.keys().copied()
    }

    pub fn records(&self) -> impl Iterator<Item = &ChunkRecord> {
        self.chunks.values()
    }

    #[must_use]
    pub fn max_id(&self) -> Option<ChunkId> {
        self.chunks.keys().next_back().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
    }

    #[must_use]
    pub fn total_words(&self) -> usize {
        self.chunks.values().map(ChunkRecord::word_count).sum()
    }
}
