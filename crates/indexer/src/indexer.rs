use crate::error::{IndexerError, Result};
use crate::index_lock::acquire_index_write_lock;
use crate::scanner::load_documents;
use crate::stats::IndexStats;
use corpus_chunker::Chunker;
use corpus_vector_store::{
    provider_from_config, recover_interrupted_save, EmbeddingProvider, LoadOutcome, SearchHit,
    StoreConfig, StoreStats, VectorStoreManager,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Drives a vector store from directories and files of extracted text.
///
/// Every write holds the store's `index.lock` for its whole duration so two
/// processes never interleave saves into one storage directory.
pub struct CorpusIndexer {
    store: VectorStoreManager,
}

impl CorpusIndexer {
    /// Indexer using the embedding provider `config` selects.
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let provider = provider_from_config(config)?;
        Self::with_provider(config, provider)
    }

    pub fn with_provider(
        config: &StoreConfig,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        let chunker = Chunker::new(config.chunker_config())?;
        Ok(Self {
            store: VectorStoreManager::new(&config.storage_dir, chunker, provider),
        })
    }

    /// Indexer that can only read: `load` and `stats` work without model
    /// assets, searches return nothing and writes fail.
    pub fn read_only(config: &StoreConfig) -> Result<Self> {
        let chunker = Chunker::new(config.chunker_config())?;
        Ok(Self {
            store: VectorStoreManager::without_provider(&config.storage_dir, chunker),
        })
    }

    pub const fn store(&self) -> &VectorStoreManager {
        &self.store
    }

    /// Replace the whole store with the documents in `dir`.
    ///
    /// Files that fail to load are reported in `IndexStats::errors` and left
    /// out; everything else is re-chunked, re-embedded and saved.
    pub async fn rebuild_from_dir(&mut self, dir: impl AsRef<Path>) -> Result<IndexStats> {
        let dir = dir.as_ref();
        if dir.exists() && !dir.is_dir() {
            return Err(IndexerError::InvalidPath(format!(
                "{} is not a directory",
                dir.display()
            )));
        }

        let start = Instant::now();
        let mut stats = IndexStats::new();
        let _write_lock = acquire_index_write_lock(self.store.layout()).await?;

        log::info!("Rebuilding vector store from {}", dir.display());
        let loaded = load_documents(dir).await;
        for error in loaded.errors {
            stats.add_error(error);
        }

        let summary = self.store.rebuild(&loaded.documents).await?;
        stats.documents = summary.documents;
        stats.chunks = summary.chunks;
        stats.time_ms = elapsed_ms(start);

        log::info!(
            "Indexed {} documents into {} chunks in {} ms ({} skipped)",
            stats.documents,
            stats.chunks,
            stats.time_ms,
            stats.errors.len()
        );
        Ok(stats)
    }

    /// Re-index a single document against the persisted store.
    ///
    /// The store is reloaded under the write lock first, after completing or
    /// discarding whatever a crashed save left staged. If that load fails
    /// nothing is touched, since saving over an unreadable store would lose it.
    pub async fn update_file(&mut self, path: impl AsRef<Path>) -> Result<IndexStats> {
        let path = path.as_ref();
        let start = Instant::now();
        let mut stats = IndexStats::new();
        let _write_lock = acquire_index_write_lock(self.store.layout()).await?;

        recover_interrupted_save(self.store.layout()).await?;
        self.store.load().await?;
        let outcome = self.store.update_document(path).await?;
        stats.add_document(outcome.added_ids.len());
        stats.time_ms = elapsed_ms(start);

        log::info!(
            "Updated {}: {} chunks replaced by {} in {} ms",
            outcome.source_file,
            outcome.removed_ids.len(),
            outcome.added_ids.len(),
            stats.time_ms
        );
        Ok(stats)
    }

    /// Load the persisted store without taking the write lock.
    pub async fn load(&mut self) -> Result<LoadOutcome> {
        Ok(self.store.load().await?)
    }

    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
        Ok(self.store.search(query, k).await?)
    }

    pub fn stats(&self) -> StoreStats {
        self.store.stats()
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
