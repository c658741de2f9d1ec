mod common;

use common::{chunker, stub_store, write_doc};
use corpus_vector_store::{
    Document, SearchHit, StoreMetadata, StubEmbedder, VectorIndex, VectorStoreError,
    VectorStoreManager, MANIFEST_FILE_NAME, METADATA_FILE_NAME,
};
use pretty_assertions::assert_eq;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

async fn populated_store(dir: &Path) -> VectorStoreManager {
    let mut store = stub_store(dir);
    store
        .rebuild(&[
            Document::new("https://a", "A", "one two three four five six", "a.txt"),
            Document::new("https://b", "B", "seven eight", "b.txt"),
        ])
        .await
        .expect("rebuild");
    store
}

#[tokio::test]
async fn saved_store_reloads_into_a_fresh_manager() {
    let tmp = TempDir::new().expect("tempdir");
    let dir = tmp.path().join("store");
    let original = populated_store(&dir).await;

    let mut reloaded = stub_store(&dir);
    let outcome = reloaded.load().await.expect("load");
    assert!(outcome.index && outcome.chunks && outcome.manifest && outcome.metadata);

    assert_eq!(reloaded.chunk_store(), original.chunk_store());
    assert_eq!(reloaded.manifest(), original.manifest());
    assert_eq!(reloaded.index(), original.index());
    assert_eq!(reloaded.next_chunk_id(), original.next_chunk_id());
    assert_eq!(reloaded.stats(), original.stats());

    let expected = original.search("three four", 3).await.expect("search");
    let actual = reloaded.search("three four", 3).await.expect("search");
    let ids = |hits: &[SearchHit]| hits.iter().map(|h| h.chunk.id).collect::<Vec<_>>();
    assert_eq!(ids(&actual), ids(&expected));
}

#[tokio::test]
async fn missing_directory_loads_empty() {
    let tmp = TempDir::new().expect("tempdir");
    let mut store = stub_store(&tmp.path().join("never-created"));
    let outcome = store.load().await.expect("load");
    assert!(!outcome.found_any());
    assert!(store.is_empty());
    assert_eq!(store.next_chunk_id(), 0);
}

#[tokio::test]
async fn metadata_only_directory_keeps_the_counter() {
    let tmp = TempDir::new().expect("tempdir");
    let dir = tmp.path().join("store");
    tokio::fs::create_dir_all(&dir).await.expect("mkdir");
    tokio::fs::write(
        dir.join(METADATA_FILE_NAME),
        r#"{"next_chunk_id": 42, "model_name": "stub-8", "total_chunks": 0}"#,
    )
    .await
    .expect("write metadata");

    let mut store = stub_store(&dir);
    let outcome = store.load().await.expect("load");
    assert!(outcome.metadata && !outcome.index && !outcome.chunks);
    assert!(store.is_empty());
    assert_eq!(store.next_chunk_id(), 42);

    let path = write_doc(tmp.path(), "a.txt", "A", "fresh content").await;
    let update = store.update_document(&path).await.expect("update");
    assert_eq!(update.added_ids, vec![42]);
}

#[tokio::test]
async fn failed_reload_keeps_prior_state() {
    let tmp = TempDir::new().expect("tempdir");
    let dir = tmp.path().join("store");
    let mut store = populated_store(&dir).await;
    let before = store.stats();

    tokio::fs::write(store.layout().chunks_path(), b"{\"0\": ")
        .await
        .expect("truncate chunks");
    let err = store.load().await.expect_err("corrupt chunks");
    assert!(matches!(err, VectorStoreError::Inconsistent(_)));
    assert_eq!(store.stats(), before);
    assert_eq!(store.document_chunk_ids("b.txt").len(), 1);
}

#[tokio::test]
async fn artifacts_from_different_saves_are_rejected() {
    let tmp = TempDir::new().expect("tempdir");
    let first_dir = tmp.path().join("first");
    let second_dir = tmp.path().join("second");
    populated_store(&first_dir).await;

    let mut other = stub_store(&second_dir);
    other
        .rebuild(&[Document::new("u", "t", "unrelated", "c.txt")])
        .await
        .expect("rebuild");

    tokio::fs::copy(
        other.layout().manifest_path(),
        first_dir.join(MANIFEST_FILE_NAME),
    )
    .await
    .expect("copy manifest");

    let mut store = stub_store(&first_dir);
    let err = store.load().await.expect_err("mixed generations");
    assert!(matches!(err, VectorStoreError::Inconsistent(_)));
}

#[tokio::test]
async fn store_built_with_another_model_is_refused() {
    let tmp = TempDir::new().expect("tempdir");
    let dir = tmp.path().join("store");
    populated_store(&dir).await;

    let mut store = VectorStoreManager::new(&dir, chunker(4, 1), Arc::new(StubEmbedder::new(16)));
    let err = store.load().await.expect_err("model mismatch");
    match err {
        VectorStoreError::ModelMismatch { stored, configured } => {
            assert_eq!(stored, "stub-8");
            assert_eq!(configured, "stub-16");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(store.is_empty());
}

#[tokio::test]
async fn stale_counter_is_advanced_past_stored_ids() {
    let tmp = TempDir::new().expect("tempdir");
    let dir = tmp.path().join("store");
    let original = populated_store(&dir).await;
    let metadata_path = original.layout().metadata_path();

    let raw = tokio::fs::read(&metadata_path).await.expect("read metadata");
    let mut metadata: StoreMetadata = serde_json::from_slice(&raw).expect("parse metadata");
    metadata.next_chunk_id = 0;
    tokio::fs::write(&metadata_path, serde_json::to_vec(&metadata).expect("encode"))
        .await
        .expect("write metadata");

    let mut store = stub_store(&dir);
    store.load().await.expect("load");
    assert_eq!(store.next_chunk_id(), original.next_chunk_id());
}

#[tokio::test]
async fn chunks_without_index_load_but_are_not_searchable() {
    let tmp = TempDir::new().expect("tempdir");
    let dir = tmp.path().join("store");
    let original = populated_store(&dir).await;
    tokio::fs::remove_file(original.layout().index_path())
        .await
        .expect("remove index");

    let mut store = stub_store(&dir);
    let outcome = store.load().await.expect("load");
    assert!(!outcome.index);
    assert_eq!(store.len(), original.len());
    assert!(store.index().is_empty());
    assert!(store.search("one two", 5).await.expect("search").is_empty());
}

#[tokio::test]
async fn store_without_provider_reports_stats() {
    let tmp = TempDir::new().expect("tempdir");
    let dir = tmp.path().join("store");
    let original = populated_store(&dir).await;

    let mut store = VectorStoreManager::without_provider(&dir, chunker(4, 1));
    store.load().await.expect("load");
    let stats = store.stats();
    assert_eq!(stats.total_chunks, original.len());
    assert_eq!(stats.embedding_dimension, 8);
    assert_eq!(stats.model_name, "stub-8");
    assert!(!stats.degraded);
    assert!(store.search("one", 3).await.expect("search").is_empty());
}
