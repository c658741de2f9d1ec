use crate::chunk_store::ChunkStore;
use crate::error::{Result, VectorStoreError};
use crate::index::VectorIndex;
use crate::manifest::DocumentManifest;
use crate::types::ChunkId;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const INDEX_FILE_NAME: &str = "index.bin";
pub const CHUNKS_FILE_NAME: &str = "chunks.json";
pub const MANIFEST_FILE_NAME: &str = "manifest.json";
pub const METADATA_FILE_NAME: &str = "store_info.json";
pub const LOCK_FILE_NAME: &str = "index.lock";

/// Fixed artifact locations inside one storage directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
    dir: PathBuf,
}

impl StoreLayout {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE_NAME)
    }

    #[must_use]
    pub fn chunks_path(&self) -> PathBuf {
        self.dir.join(CHUNKS_FILE_NAME)
    }

    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE_NAME)
    }

    #[must_use]
    pub fn metadata_path(&self) -> PathBuf {
        self.dir.join(METADATA_FILE_NAME)
    }

    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        self.dir.join(LOCK_FILE_NAME)
    }
}

/// Store-level bookkeeping persisted beside the data artifacts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreMetadata {
    pub next_chunk_id: ChunkId,
    pub model_name: String,
    pub total_chunks: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<usize>,
    /// SHA-256 of each artifact written by the same save, keyed by file name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub checksums: BTreeMap<String, String>,
}

/// Borrowed view of everything `save_store` writes
pub struct StoreSnapshot<'a, I: VectorIndex> {
    pub index: &'a I,
    pub chunks: &'a ChunkStore,
    pub manifest: &'a DocumentManifest,
    pub next_chunk_id: ChunkId,
    pub model_name: &'a str,
}

/// Artifacts found on disk; `None` for each one that is absent
#[derive(Debug)]
pub struct LoadedArtifacts<I> {
    pub index: Option<I>,
    pub chunks: Option<ChunkStore>,
    pub manifest: Option<DocumentManifest>,
    pub metadata: Option<StoreMetadata>,
}

/// Write all four artifacts.
///
/// Everything is serialized before the first write, each artifact goes to a
/// `.tmp` sibling, and the renames happen last with metadata renamed after the
/// data it describes. A crash mid-rename leaves checksums that no longer match,
/// which `load_store` reports instead of mixing generations until
/// `recover_interrupted_save` completes the renames.
pub async fn save_store<I: VectorIndex>(
    layout: &StoreLayout,
    snapshot: &StoreSnapshot<'_, I>,
) -> Result<()> {
    let index_bytes = snapshot.index.to_bytes();
    let chunk_bytes = serde_json::to_vec(snapshot.chunks)?;
    let manifest_bytes = serde_json::to_vec_pretty(snapshot.manifest)?;

    let mut checksums = BTreeMap::new();
    checksums.insert(INDEX_FILE_NAME.to_string(), sha256_hex(&index_bytes));
    checksums.insert(CHUNKS_FILE_NAME.to_string(), sha256_hex(&chunk_bytes));
    checksums.insert(MANIFEST_FILE_NAME.to_string(), sha256_hex(&manifest_bytes));

    let metadata = StoreMetadata {
        next_chunk_id: snapshot.next_chunk_id,
        model_name: snapshot.model_name.to_string(),
        total_chunks: snapshot.chunks.len(),
        dimension: Some(snapshot.index.dimension()),
        checksums,
    };
    let metadata_bytes = serde_json::to_vec_pretty(&metadata)?;

    tokio::fs::create_dir_all(layout.dir()).await?;

    let staged = [
        (layout.index_path(), index_bytes),
        (layout.chunks_path(), chunk_bytes),
        (layout.manifest_path(), manifest_bytes),
        (layout.metadata_path(), metadata_bytes),
    ];

    let mut tmp_paths = Vec::with_capacity(staged.len());
    for (path, bytes) in &staged {
        let tmp = tmp_path(path);
        if let Err(err) = tokio::fs::write(&tmp, bytes).await {
            discard(&tmp_paths).await;
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(err.into());
        }
        tmp_paths.push(tmp);
    }

    for ((path, _), tmp) in staged.iter().zip(&tmp_paths) {
        tokio::fs::rename(tmp, path).await.map_err(|err| {
            VectorStoreError::Persistence(format!(
                "commit {} -> {}: {err}",
                tmp.display(),
                path.display()
            ))
        })?;
    }

    log::info!(
        "Saved vector store to {} ({} chunks, {} documents, next id {})",
        layout.dir().display(),
        snapshot.chunks.len(),
        snapshot.manifest.len(),
        snapshot.next_chunk_id
    );
    Ok(())
}

/// Read whichever artifacts exist.
///
/// Unparsable artifacts and checksum mismatches are errors; absent artifacts
/// are not.
pub async fn load_store<I: VectorIndex>(layout: &StoreLayout) -> Result<LoadedArtifacts<I>> {
    let index_bytes = read_optional(&layout.index_path()).await?;
    let chunk_bytes = read_optional(&layout.chunks_path()).await?;
    let manifest_bytes = read_optional(&layout.manifest_path()).await?;
    let metadata_bytes = read_optional(&layout.metadata_path()).await?;

    let metadata: Option<StoreMetadata> = metadata_bytes
        .as_deref()
        .map(serde_json::from_slice)
        .transpose()?;

    if let Some(metadata) = &metadata {
        verify_checksum(metadata, INDEX_FILE_NAME, index_bytes.as_deref())?;
        verify_checksum(metadata, CHUNKS_FILE_NAME, chunk_bytes.as_deref())?;
        verify_checksum(metadata, MANIFEST_FILE_NAME, manifest_bytes.as_deref())?;
    }

    let index = index_bytes.as_deref().map(I::from_bytes).transpose()?;
    let chunks: Option<ChunkStore> = chunk_bytes
        .as_deref()
        .map(serde_json::from_slice)
        .transpose()?;
    let manifest: Option<DocumentManifest> = manifest_bytes
        .as_deref()
        .map(serde_json::from_slice)
        .transpose()?;

    Ok(LoadedArtifacts {
        index,
        chunks,
        manifest,
        metadata,
    })
}

/// What `recover_interrupted_save` found in a storage directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveRecovery {
    /// No staging files were present
    Clean,
    /// A fully staged save had stopped part way through its renames and was
    /// completed
    RolledForward,
    /// Staging files from a save that never finished writing were removed;
    /// the previous generation stands
    Discarded,
}

/// Finish or clean up a save that crashed after staging its `.tmp` files.
///
/// The staged metadata is written last, so its presence means every data
/// artifact was staged. When each artifact (still staged, or already renamed)
/// matches the staged checksums the remaining renames are replayed, metadata
/// last. Otherwise the leftovers are deleted. Callers must hold the store's
/// write lock: a save in progress looks exactly like an interrupted one.
pub async fn recover_interrupted_save(layout: &StoreLayout) -> Result<SaveRecovery> {
    let data = [
        (INDEX_FILE_NAME, layout.index_path()),
        (CHUNKS_FILE_NAME, layout.chunks_path()),
        (MANIFEST_FILE_NAME, layout.manifest_path()),
    ];
    let metadata_path = layout.metadata_path();
    let targets: Vec<&PathBuf> = data
        .iter()
        .map(|(_, path)| path)
        .chain(std::iter::once(&metadata_path))
        .collect();

    let mut leftovers = Vec::new();
    for path in &targets {
        let tmp = tmp_path(path);
        if tokio::fs::try_exists(&tmp).await? {
            leftovers.push(tmp);
        }
    }
    if leftovers.is_empty() {
        return Ok(SaveRecovery::Clean);
    }

    let staged_metadata = read_optional(&tmp_path(&metadata_path))
        .await?
        .and_then(|bytes| serde_json::from_slice::<StoreMetadata>(&bytes).ok());
    if let Some(metadata) = staged_metadata {
        if staged_generation_complete(&metadata, &data).await? {
            for path in &targets {
                let tmp = tmp_path(path);
                if tokio::fs::try_exists(&tmp).await? {
                    tokio::fs::rename(&tmp, path).await.map_err(|err| {
                        VectorStoreError::Persistence(format!(
                            "roll forward {} -> {}: {err}",
                            tmp.display(),
                            path.display()
                        ))
                    })?;
                }
            }
            log::warn!(
                "Completed an interrupted save in {} (next id {})",
                layout.dir().display(),
                metadata.next_chunk_id
            );
            return Ok(SaveRecovery::RolledForward);
        }
    }

    discard(&leftovers).await;
    log::warn!(
        "Removed {} staging files of an unfinished save in {}",
        leftovers.len(),
        layout.dir().display()
    );
    Ok(SaveRecovery::Discarded)
}

async fn staged_generation_complete(
    metadata: &StoreMetadata,
    data: &[(&str, PathBuf)],
) -> Result<bool> {
    for (name, path) in data {
        let Some(expected) = metadata.checksums.get(*name) else {
            return Ok(false);
        };
        let bytes = match read_optional(&tmp_path(path)).await? {
            Some(bytes) => Some(bytes),
            None => read_optional(path).await?,
        };
        match bytes {
            Some(bytes) if &sha256_hex(&bytes) == expected => {}
            _ => return Ok(false),
        }
    }
    Ok(true)
}

fn verify_checksum(metadata: &StoreMetadata, name: &str, bytes: Option<&[u8]>) -> Result<()> {
    let (Some(expected), Some(bytes)) = (metadata.checksums.get(name), bytes) else {
        return Ok(());
    };
    let actual = sha256_hex(bytes);
    if &actual != expected {
        return Err(VectorStoreError::Inconsistent(format!(
            "{name} does not match the checksum recorded in {METADATA_FILE_NAME} (interrupted save?)"
        )));
    }
    Ok(())
}

async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(VectorStoreError::Persistence(format!(
            "read {}: {err}",
            path.display()
        ))),
    }
}

async fn discard(paths: &[PathBuf]) {
    for path in paths {
        let _ = tokio::fs::remove_file(path).await;
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::FlatIndex;
    use crate::types::ChunkRecord;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn populated() -> (FlatIndex, ChunkStore, DocumentManifest) {
        let mut index = FlatIndex::new(2);
        index
            .add(&[4, 5], &[vec![1.0, 0.0], vec![0.0, 1.0]])
            .unwrap();
        let mut chunks = ChunkStore::new();
        let mut manifest = DocumentManifest::new();
        for id in [4, 5] {
            chunks.put(ChunkRecord {
                id,
                url: "u".to_string(),
                title: "t".to_string(),
                chunk_text: format!("chunk {id}"),
                source_file: "a.txt".to_string(),
            });
            manifest.append("a.txt", id);
        }
        (index, chunks, manifest)
    }

    #[tokio::test]
    async fn save_then_load_restores_every_artifact() {
        let tmp = TempDir::new().unwrap();
        let layout = StoreLayout::new(tmp.path().join("store"));
        let (index, chunks, manifest) = populated();

        save_store(
            &layout,
            &StoreSnapshot {
                index: &index,
                chunks: &chunks,
                manifest: &manifest,
                next_chunk_id: 6,
                model_name: "stub-2",
            },
        )
        .await
        .unwrap();

        let loaded = load_store::<FlatIndex>(&layout).await.unwrap();
        assert_eq!(loaded.index, Some(index));
        assert_eq!(loaded.chunks, Some(chunks));
        assert_eq!(loaded.manifest, Some(manifest));
        let metadata = loaded.metadata.unwrap();
        assert_eq!(metadata.next_chunk_id, 6);
        assert_eq!(metadata.total_chunks, 2);
        assert_eq!(metadata.dimension, Some(2));
        assert_eq!(metadata.checksums.len(), 3);

        let mut leftovers = tokio::fs::read_dir(layout.dir()).await.unwrap();
        while let Some(entry) = leftovers.next_entry().await.unwrap() {
            let name = entry.file_name().to_string_lossy().into_owned();
            assert!(!name.ends_with(".tmp"), "stale staging file {name}");
        }
    }

    #[tokio::test]
    async fn empty_directory_loads_nothing() {
        let tmp = TempDir::new().unwrap();
        let layout = StoreLayout::new(tmp.path());
        let loaded = load_store::<FlatIndex>(&layout).await.unwrap();
        assert!(loaded.index.is_none());
        assert!(loaded.chunks.is_none());
        assert!(loaded.manifest.is_none());
        assert!(loaded.metadata.is_none());
    }

    #[tokio::test]
    async fn mismatched_generation_is_detected() {
        let tmp = TempDir::new().unwrap();
        let layout = StoreLayout::new(tmp.path());
        let (index, chunks, manifest) = populated();
        save_store(
            &layout,
            &StoreSnapshot {
                index: &index,
                chunks: &chunks,
                manifest: &manifest,
                next_chunk_id: 6,
                model_name: "stub-2",
            },
        )
        .await
        .unwrap();

        // A manifest from some other save
        tokio::fs::write(layout.manifest_path(), br#"{"a.txt":[4]}"#)
            .await
            .unwrap();
        let err = load_store::<FlatIndex>(&layout).await.unwrap_err();
        assert!(matches!(err, VectorStoreError::Inconsistent(_)));
    }

    #[tokio::test]
    async fn unparsable_artifact_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let layout = StoreLayout::new(tmp.path());
        tokio::fs::write(layout.chunks_path(), b"{not json").await.unwrap();
        assert!(load_store::<FlatIndex>(&layout).await.is_err());
    }

    async fn save_generation(layout: &StoreLayout, next_chunk_id: ChunkId) -> ChunkStore {
        let (index, mut chunks, manifest) = populated();
        if let Some(record) = chunks.get(5).cloned() {
            chunks.put(ChunkRecord {
                chunk_text: format!("generation {next_chunk_id}"),
                ..record
            });
        }
        save_store(
            layout,
            &StoreSnapshot {
                index: &index,
                chunks: &chunks,
                manifest: &manifest,
                next_chunk_id,
                model_name: "stub-2",
            },
        )
        .await
        .unwrap();
        chunks
    }

    /// Leave `dir` as a save of generation `next` would after renaming only
    /// the index: the other new artifacts still sit in `.tmp` siblings.
    async fn crash_after_first_rename(
        layout: &StoreLayout,
        scratch: &Path,
        next: ChunkId,
    ) -> ChunkStore {
        let staged = StoreLayout::new(scratch);
        let chunks = save_generation(&staged, next).await;
        for (from, to) in [
            (staged.index_path(), layout.index_path()),
            (staged.chunks_path(), tmp_path(&layout.chunks_path())),
            (staged.manifest_path(), tmp_path(&layout.manifest_path())),
            (staged.metadata_path(), tmp_path(&layout.metadata_path())),
        ] {
            tokio::fs::copy(from, to).await.unwrap();
        }
        chunks
    }

    #[tokio::test]
    async fn interrupted_renames_are_rolled_forward() {
        let tmp = TempDir::new().unwrap();
        let layout = StoreLayout::new(tmp.path().join("store"));
        save_generation(&layout, 6).await;

        let newer = crash_after_first_rename(&layout, &tmp.path().join("scratch"), 9).await;
        let before = load_store::<FlatIndex>(&layout).await.unwrap();
        assert_eq!(before.metadata.unwrap().next_chunk_id, 6);

        assert_eq!(
            recover_interrupted_save(&layout).await.unwrap(),
            SaveRecovery::RolledForward
        );
        let loaded = load_store::<FlatIndex>(&layout).await.unwrap();
        assert_eq!(loaded.metadata.unwrap().next_chunk_id, 9);
        assert_eq!(loaded.chunks, Some(newer));
        assert_eq!(
            recover_interrupted_save(&layout).await.unwrap(),
            SaveRecovery::Clean
        );
    }

    #[tokio::test]
    async fn torn_rename_is_inconsistent_until_recovered() {
        let tmp = TempDir::new().unwrap();
        let layout = StoreLayout::new(tmp.path().join("store"));
        save_generation(&layout, 6).await;
        let staged = StoreLayout::new(tmp.path().join("scratch"));
        save_generation(&staged, 9).await;

        // Chunks renamed into place, manifest and metadata still staged
        tokio::fs::copy(staged.chunks_path(), layout.chunks_path()).await.unwrap();
        tokio::fs::copy(staged.manifest_path(), tmp_path(&layout.manifest_path())).await.unwrap();
        tokio::fs::copy(staged.metadata_path(), tmp_path(&layout.metadata_path())).await.unwrap();
        let err = load_store::<FlatIndex>(&layout).await.unwrap_err();
        assert!(matches!(err, VectorStoreError::Inconsistent(_)));

        assert_eq!(
            recover_interrupted_save(&layout).await.unwrap(),
            SaveRecovery::RolledForward
        );
        let loaded = load_store::<FlatIndex>(&layout).await.unwrap();
        assert_eq!(loaded.metadata.unwrap().next_chunk_id, 9);
    }

    #[tokio::test]
    async fn unfinished_staging_is_discarded() {
        let tmp = TempDir::new().unwrap();
        let layout = StoreLayout::new(tmp.path());
        let current = save_generation(&layout, 6).await;
        tokio::fs::write(tmp_path(&layout.index_path()), b"partial")
            .await
            .unwrap();
        tokio::fs::write(tmp_path(&layout.metadata_path()), b"{\"next_chunk")
            .await
            .unwrap();

        assert_eq!(
            recover_interrupted_save(&layout).await.unwrap(),
            SaveRecovery::Discarded
        );
        assert!(!tmp_path(&layout.index_path()).exists());
        assert!(!tmp_path(&layout.metadata_path()).exists());
        let loaded = load_store::<FlatIndex>(&layout).await.unwrap();
        assert_eq!(loaded.chunks, Some(current));
        assert_eq!(loaded.metadata.unwrap().next_chunk_id, 6);
    }

    #[test]
    fn metadata_without_optional_fields_parses() {
        let metadata: StoreMetadata = serde_json::from_str(
            r#"{"next_chunk_id": 12, "model_name": "all-MiniLM-L6-v2", "total_chunks": 0}"#,
        )
        .unwrap();
        assert_eq!(metadata.next_chunk_id, 12);
        assert!(metadata.dimension.is_none());
        assert!(metadata.checksums.is_empty());
    }
}
