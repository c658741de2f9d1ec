use crate::chunk_store::ChunkStore;
use crate::document::{load_document, source_key, Document};
use crate::embeddings::EmbeddingProvider;
use crate::error::{Result, VectorStoreError};
use crate::index::{FlatIndex, VectorIndex};
use crate::manifest::DocumentManifest;
use crate::persistence::{load_store, save_store, StoreLayout, StoreMetadata, StoreSnapshot};
use crate::types::{
    similarity_from_distance, ChunkId, ChunkRecord, RebuildSummary, SearchHit, StoreStats,
    UpdateOutcome,
};
use corpus_chunker::Chunker;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Which artifacts a successful `load` found on disk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadOutcome {
    pub index: bool,
    pub chunks: bool,
    pub manifest: bool,
    pub metadata: bool,
}

impl LoadOutcome {
    #[must_use]
    pub const fn found_any(&self) -> bool {
        self.index || self.chunks || self.manifest || self.metadata
    }
}

/// Owns the chunk store, manifest, id counter and index for one storage
/// directory, and drives chunking and embedding into them.
///
/// Writers take `&mut self`; the type does no internal locking. Hosts that
/// share one manager across tasks must serialize writers themselves.
pub struct VectorStoreManager<I: VectorIndex = FlatIndex> {
    layout: StoreLayout,
    chunker: Chunker,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    index: I,
    chunks: ChunkStore,
    manifest: DocumentManifest,
    next_chunk_id: ChunkId,
    model_name: String,
}

impl VectorStoreManager<FlatIndex> {
    /// Empty store backed by an exact flat index sized to the provider.
    pub fn new(
        storage_dir: impl Into<PathBuf>,
        chunker: Chunker,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        let index = FlatIndex::new(embedder.dimension());
        Self::with_index(storage_dir, chunker, Some(embedder), index)
    }

    /// Manager with no embedding capability: `load`, `stats` and `save` work,
    /// `search` returns nothing, and writes fail with `ProviderUnavailable`.
    pub fn without_provider(storage_dir: impl Into<PathBuf>, chunker: Chunker) -> Self {
        Self::with_index(storage_dir, chunker, None, FlatIndex::new(0))
    }
}

impl<I: VectorIndex> VectorStoreManager<I> {
    pub fn with_index(
        storage_dir: impl Into<PathBuf>,
        chunker: Chunker,
        embedder: Option<Arc<dyn EmbeddingProvider>>,
        index: I,
    ) -> Self {
        let model_name = embedder
            .as_ref()
            .map(|e| e.model_name().to_string())
            .unwrap_or_default();
        if embedder.as_ref().is_some_and(|e| e.is_degraded()) {
            log::warn!("Vector store running with degraded embeddings ('{model_name}')");
        }
        Self {
            layout: StoreLayout::new(storage_dir),
            chunker,
            embedder,
            index,
            chunks: ChunkStore::new(),
            manifest: DocumentManifest::new(),
            next_chunk_id: 0,
            model_name,
        }
    }

    #[must_use]
    pub const fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    #[must_use]
    pub fn storage_dir(&self) -> &Path {
        self.layout.dir()
    }

    #[must_use]
    pub const fn next_chunk_id(&self) -> ChunkId {
        self.next_chunk_id
    }

    #[must_use]
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    #[must_use]
    pub fn chunk(&self, id: ChunkId) -> Option<&ChunkRecord> {
        self.chunks.get(id)
    }

    #[must_use]
    pub fn document_chunk_ids(&self, source_file: &str) -> &[ChunkId] {
        self.manifest.get(source_file)
    }

    #[must_use]
    pub fn documents(&self) -> Vec<String> {
        self.manifest.files().map(|(path, _)| path.to_string()).collect()
    }

    #[must_use]
    pub const fn chunk_store(&self) -> &ChunkStore {
        &self.chunks
    }

    #[must_use]
    pub const fn manifest(&self) -> &DocumentManifest {
        &self.manifest
    }

    #[must_use]
    pub const fn index(&self) -> &I {
        &self.index
    }

    fn require_embedder(&self) -> Result<Arc<dyn EmbeddingProvider>> {
        self.embedder
            .clone()
            .ok_or(VectorStoreError::ProviderUnavailable)
    }

    /// Replace the whole store with `documents`, in memory only.
    ///
    /// Ids restart at 0. New state is staged first and swapped in after every
    /// chunk is embedded, so an embedding failure leaves the previous content
    /// untouched. The index receives a single batched `add`.
    pub async fn generate_embeddings(&mut self, documents: &[Document]) -> Result<RebuildSummary> {
        let embedder = self.require_embedder()?;
        log::info!("Generating embeddings from scratch for {} documents", documents.len());

        let mut chunks = ChunkStore::new();
        let mut manifest = DocumentManifest::new();
        let mut next_id: ChunkId = 0;
        let mut batch_ids = Vec::new();
        let mut batch_vectors = Vec::new();

        for doc in documents {
            if manifest.contains(&doc.source_file) {
                log::warn!(
                    "Document {} appears more than once; appending its chunks",
                    doc.source_file
                );
            } else {
                manifest.set(doc.source_file.clone(), Vec::new());
            }

            let texts = self.chunker.chunk(&doc.text);
            let vectors = embed_all(embedder.as_ref(), &texts).await?;
            for (text, vector) in texts.into_iter().zip(vectors) {
                let id = next_id;
                next_id += 1;
                chunks.put(ChunkRecord {
                    id,
                    url: doc.url.clone(),
                    title: doc.title.clone(),
                    chunk_text: text,
                    source_file: doc.source_file.clone(),
                });
                manifest.append(&doc.source_file, id);
                batch_ids.push(id);
                batch_vectors.push(vector);
            }
        }

        self.index.reset();
        self.index.add(&batch_ids, &batch_vectors)?;
        self.chunks = chunks;
        self.manifest = manifest;
        self.next_chunk_id = next_id;
        self.model_name = embedder.model_name().to_string();

        log::info!("Generated {} chunks total.", batch_ids.len());
        Ok(RebuildSummary {
            documents: self.manifest.len(),
            chunks: batch_ids.len(),
        })
    }

    /// `generate_embeddings` followed by `save`.
    pub async fn rebuild(&mut self, documents: &[Document]) -> Result<RebuildSummary> {
        let summary = self.generate_embeddings(documents).await?;
        self.save().await?;
        Ok(summary)
    }

    /// Re-index one document file and persist the store.
    ///
    /// The file's previous chunks are dropped before the new text is read, so
    /// a read or embedding failure after that point leaves the document absent
    /// in memory (disk still holds the last saved state). Replacement chunks
    /// always get fresh ids; retired ids never come back.
    pub async fn update_document(&mut self, source_file: impl AsRef<Path>) -> Result<UpdateOutcome> {
        let path = source_file.as_ref();
        log::info!("Updating document: {}", path.display());

        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => {
                return Err(VectorStoreError::NotFound(format!(
                    "{} is not a file",
                    path.display()
                )))
            }
            Err(_) => {
                log::error!("File not found: {}", path.display());
                return Err(VectorStoreError::NotFound(path.display().to_string()));
            }
        }
        let embedder = self.require_embedder()?;
        let key = source_key(path);

        let removed_ids = self.manifest.remove(&key).unwrap_or_default();
        if !removed_ids.is_empty() {
            self.index.remove(&removed_ids);
            for id in &removed_ids {
                self.chunks.remove(*id);
            }
            log::info!("Removed {} old chunks.", removed_ids.len());
        }

        let doc = load_document(path).await.map_err(|err| {
            log::error!("Failed to process {}: {err}", path.display());
            err
        })?;
        let texts = self.chunker.chunk(&doc.text);
        let vectors = embed_all(embedder.as_ref(), &texts).await?;

        let first_id = self.next_chunk_id;
        let added_ids: Vec<ChunkId> = (first_id..first_id + texts.len() as ChunkId).collect();
        self.index.add(&added_ids, &vectors)?;
        self.next_chunk_id = first_id + added_ids.len() as ChunkId;

        for (id, text) in added_ids.iter().zip(texts) {
            self.chunks.put(ChunkRecord {
                id: *id,
                url: doc.url.clone(),
                title: doc.title.clone(),
                chunk_text: text,
                source_file: key.clone(),
            });
        }
        self.manifest.set(key.clone(), added_ids.clone());
        log::info!("Added {} new chunks.", added_ids.len());

        self.save().await?;
        Ok(UpdateOutcome {
            source_file: key,
            removed_ids,
            added_ids,
        })
    }

    /// k nearest chunks to `query`, most similar first.
    ///
    /// Blank queries and managers without a provider yield no hits.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
        if query.trim().is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        let Some(embedder) = &self.embedder else {
            log::debug!("Search skipped: no embedding provider configured");
            return Ok(Vec::new());
        };

        let query_vector = embedder.embed(query).await?;
        let neighbors = self.index.search(&query_vector, k)?;

        let hits: Vec<SearchHit> = neighbors
            .into_iter()
            .filter_map(|(id, distance)| {
                let Some(chunk) = self.chunks.get(id) else {
                    log::warn!("Index returned chunk {id} with no record; skipping");
                    return None;
                };
                Some(SearchHit {
                    chunk: chunk.clone(),
                    distance,
                    similarity: similarity_from_distance(distance),
                })
            })
            .collect();

        log::debug!("Search '{query}' (k={k}) -> {} hits", hits.len());
        Ok(hits)
    }

    #[must_use]
    pub fn stats(&self) -> StoreStats {
        let total_chunks = self.chunks.len();
        let total_words = self.chunks.total_words();
        #[allow(clippy::cast_precision_loss)]
        let average_chunk_length = if total_chunks == 0 {
            0.0
        } else {
            total_words as f64 / total_chunks as f64
        };
        let embedding_dimension = self
            .embedder
            .as_ref()
            .map_or_else(|| self.index.dimension(), |e| e.dimension());

        StoreStats {
            total_chunks,
            unique_documents: self.manifest.len(),
            total_words,
            average_chunk_length,
            next_chunk_id: self.next_chunk_id,
            embedding_dimension,
            model_name: self.model_name.clone(),
            degraded: self.embedder.as_ref().is_some_and(|e| e.is_degraded()),
        }
    }

    /// Persist index, chunk store, manifest and metadata.
    pub async fn save(&self) -> Result<()> {
        save_store(
            &self.layout,
            &StoreSnapshot {
                index: &self.index,
                chunks: &self.chunks,
                manifest: &self.manifest,
                next_chunk_id: self.next_chunk_id,
                model_name: &self.model_name,
            },
        )
        .await
    }

    /// Replace in-memory state with what is on disk.
    ///
    /// Missing artifacts load as empty. Any read, parse, checksum, model or
    /// consistency failure is returned and leaves the current state as it was.
    pub async fn load(&mut self) -> Result<LoadOutcome> {
        match self.load_staged().await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                log::error!(
                    "Failed to load vector store from {}: {err}",
                    self.layout.dir().display()
                );
                Err(err)
            }
        }
    }

    async fn load_staged(&mut self) -> Result<LoadOutcome> {
        let loaded = load_store::<I>(&self.layout).await?;
        let outcome = LoadOutcome {
            index: loaded.index.is_some(),
            chunks: loaded.chunks.is_some(),
            manifest: loaded.manifest.is_some(),
            metadata: loaded.metadata.is_some(),
        };

        if let (Some(metadata), Some(embedder)) = (&loaded.metadata, &self.embedder) {
            if metadata.model_name != embedder.model_name() {
                return Err(VectorStoreError::ModelMismatch {
                    stored: metadata.model_name.clone(),
                    configured: embedder.model_name().to_string(),
                });
            }
        }

        let chunks = loaded.chunks.unwrap_or_default();
        let manifest = loaded.manifest.unwrap_or_default();
        check_manifest(&chunks, &manifest)?;

        let index = match loaded.index {
            Some(index) => {
                if let Some(embedder) = &self.embedder {
                    if index.dimension() != embedder.dimension() {
                        return Err(VectorStoreError::InvalidDimension {
                            expected: embedder.dimension(),
                            actual: index.dimension(),
                        });
                    }
                }
                let indexed: BTreeSet<ChunkId> = index.ids().into_iter().collect();
                let stored: BTreeSet<ChunkId> = chunks.ids().collect();
                if indexed != stored {
                    return Err(VectorStoreError::Inconsistent(format!(
                        "index holds {} ids but chunk store holds {} ({} differ)",
                        indexed.len(),
                        stored.len(),
                        indexed.symmetric_difference(&stored).count()
                    )));
                }
                Some(index)
            }
            None => {
                if !chunks.is_empty() {
                    log::warn!(
                        "{} chunks loaded without an index artifact; they will not appear in search until the store is rebuilt",
                        chunks.len()
                    );
                }
                None
            }
        };

        let next_chunk_id = resolve_next_id(loaded.metadata.as_ref(), &chunks);

        // Commit: nothing above touched `self`.
        match index {
            Some(index) => self.index = index,
            None => self.index.reset(),
        }
        if let Some(metadata) = &loaded.metadata {
            self.model_name = metadata.model_name.clone();
        }
        self.chunks = chunks;
        self.manifest = manifest;
        self.next_chunk_id = next_chunk_id;

        log::info!(
            "Loaded vector store from {}: {} chunks, {} documents, next id {}",
            self.layout.dir().display(),
            self.chunks.len(),
            self.manifest.len(),
            self.next_chunk_id
        );
        Ok(outcome)
    }
}

async fn embed_all(embedder: &dyn EmbeddingProvider, texts: &[String]) -> Result<Vec<Vec<f32>>> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }
    let vectors = embedder.embed_batch(texts).await?;
    if vectors.len() != texts.len() {
        return Err(VectorStoreError::EmbeddingError(format!(
            "provider returned {} vectors for {} texts",
            vectors.len(),
            texts.len()
        )));
    }
    Ok(vectors)
}

/// Every chunk belongs to exactly one manifest entry and vice versa.
fn check_manifest(chunks: &ChunkStore, manifest: &DocumentManifest) -> Result<()> {
    let mut seen = BTreeSet::new();
    for (path, ids) in manifest.files() {
        for id in ids {
            if !seen.insert(*id) {
                return Err(VectorStoreError::Inconsistent(format!(
                    "chunk {id} is listed under more than one document (last: {path})"
                )));
            }
            match chunks.get(*id) {
                Some(record) if record.source_file == path => {}
                Some(record) => {
                    return Err(VectorStoreError::Inconsistent(format!(
                        "chunk {id} is listed under {path} but belongs to {}",
                        record.source_file
                    )))
                }
                None => {
                    return Err(VectorStoreError::Inconsistent(format!(
                        "manifest entry {path} references missing chunk {id}"
                    )))
                }
            }
        }
    }
    if seen.len() != chunks.len() {
        return Err(VectorStoreError::Inconsistent(format!(
            "{} chunks are not listed in the manifest",
            chunks.len() - seen.len()
        )));
    }
    Ok(())
}

fn resolve_next_id(metadata: Option<&StoreMetadata>, chunks: &ChunkStore) -> ChunkId {
    let persisted = metadata.map_or(0, |m| m.next_chunk_id);
    let floor = chunks.max_id().map_or(0, |max| max + 1);
    if persisted < floor {
        log::warn!("Persisted next_chunk_id {persisted} is behind stored ids; advancing to {floor}");
        return floor;
    }
    persisted
}
