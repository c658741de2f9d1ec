use crate::types::ChunkId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Source file path -> ordered chunk ids currently representing it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentManifest {
    files: BTreeMap<String, Vec<ChunkId>>,
}

impl DocumentManifest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, source_file: impl Into<String>, ids: Vec<ChunkId>) {
        self.files.insert(source_file.into(), ids);
    }

    pub fn append(&mut self, source_file: &str, id: ChunkId) {
        self.files
            .entry(source_file.to_string())
            .or_default()
            .push(id);
    }

    /// Ids for `source_file`; empty when the file is not indexed
    #[must_use]
    pub fn get(&self, source_file: &str) -> &[ChunkId] {
        self.files.get(source_file).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn contains(&self, source_file: &str) -> bool {
        self.files.contains_key(source_file)
    }

    pub fn remove(&mut self, source_file: &str) -> Option<Vec<ChunkId>> {
        self.files.remove(source_file)
    }

    pub fn files(&self) -> impl Iterator<Item = (&str, &[ChunkId])> {
        self.files
            .iter()
            .map(|(path, ids)| (path.as_str(), ids.as_slice()))
    }

    pub fn all_ids(&self) -> impl Iterator<Item = ChunkId> + '_ {
        self.files.values().flatten().copied()
    }

    /// Number of documents
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }
}
