use corpus_indexer::{CorpusIndexer, IndexerError};
use corpus_vector_store::{EmbeddingMode, StoreConfig, VectorStoreError};
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn stub_config(root: &Path) -> StoreConfig {
    StoreConfig {
        storage_dir: root.join("vector_store"),
        embedding_mode: EmbeddingMode::Stub,
        chunk_size: 4,
        chunk_overlap: 1,
        ..StoreConfig::default()
    }
}

async fn write_doc(dir: &Path, name: &str, body: &str) -> PathBuf {
    tokio::fs::create_dir_all(dir).await.expect("create docs dir");
    let path = dir.join(name);
    let content = format!(
        "URL: https://example.edu/{name}\nTitle: {name}\n{}\n{body}",
        "-".repeat(30)
    );
    tokio::fs::write(&path, content).await.expect("write doc");
    path
}

#[tokio::test]
async fn rebuild_from_dir_indexes_documents_in_path_order() {
    let temp = TempDir::new().expect("tempdir");
    let docs = temp.path().join("extracted_text");
    write_doc(&docs, "b.txt", "hostel rules").await;
    write_doc(&docs, "a.txt", "one two three four five six seven").await;
    tokio::fs::write(docs.join("broken.txt"), [0xff, 0x00, 0xfe])
        .await
        .expect("write broken");

    let config = stub_config(temp.path());
    let mut indexer = CorpusIndexer::new(&config).expect("indexer");
    let stats = indexer.rebuild_from_dir(&docs).await.expect("rebuild");

    assert_eq!(stats.documents, 2);
    assert_eq!(stats.chunks, 4);
    assert_eq!(stats.errors.len(), 1);
    assert!(stats.errors[0].contains("broken.txt"));

    let a = docs.join("a.txt").to_string_lossy().into_owned();
    let b = docs.join("b.txt").to_string_lossy().into_owned();
    assert_eq!(indexer.store().document_chunk_ids(&a), &[0, 1, 2]);
    assert_eq!(indexer.store().document_chunk_ids(&b), &[3]);
    assert!(config.storage_dir.join("store_info.json").exists());
    assert!(config.storage_dir.join("index.lock").exists());
}

#[tokio::test]
async fn rebuild_from_missing_dir_empties_the_store() {
    let temp = TempDir::new().expect("tempdir");
    let docs = temp.path().join("docs");
    write_doc(&docs, "a.txt", "some words").await;

    let config = stub_config(temp.path());
    let mut indexer = CorpusIndexer::new(&config).expect("indexer");
    indexer.rebuild_from_dir(&docs).await.expect("rebuild");
    assert_eq!(indexer.stats().total_chunks, 1);

    let stats = indexer
        .rebuild_from_dir(temp.path().join("absent"))
        .await
        .expect("rebuild from missing dir");
    assert_eq!(stats.documents, 0);
    assert_eq!(indexer.stats().total_chunks, 0);
}

#[tokio::test]
async fn rebuild_from_a_file_is_rejected() {
    let temp = TempDir::new().expect("tempdir");
    let file = write_doc(temp.path(), "a.txt", "words").await;

    let mut indexer = CorpusIndexer::new(&stub_config(temp.path())).expect("indexer");
    let err = indexer.rebuild_from_dir(&file).await.expect_err("not a dir");
    assert!(matches!(err, IndexerError::InvalidPath(_)));
}

#[tokio::test]
async fn update_file_works_against_the_persisted_store() {
    let temp = TempDir::new().expect("tempdir");
    let docs = temp.path().join("extracted_text");
    write_doc(&docs, "a.txt", "alpha beta gamma").await;
    let config = stub_config(temp.path());

    let mut builder = CorpusIndexer::new(&config).expect("indexer");
    builder.rebuild_from_dir(&docs).await.expect("rebuild");

    // A separate process updating the same store sees the saved counter
    let path = write_doc(&docs, "new.txt", "one two three four five").await;
    let mut updater = CorpusIndexer::new(&config).expect("indexer");
    let stats = updater.update_file(&path).await.expect("update");
    assert_eq!(stats.documents, 1);
    assert_eq!(stats.chunks, 2);

    let key = path.to_string_lossy().into_owned();
    assert_eq!(updater.store().document_chunk_ids(&key), &[1, 2]);
    assert_eq!(updater.stats().unique_documents, 2);

    let mut reader = CorpusIndexer::read_only(&config).expect("reader");
    reader.load().await.expect("load");
    assert_eq!(reader.stats().total_chunks, 3);
    assert_eq!(reader.stats().next_chunk_id, 3);
    assert!(reader.search("alpha", 3).await.expect("search").is_empty());
}

#[tokio::test]
async fn update_file_refuses_to_overwrite_an_unreadable_store() {
    let temp = TempDir::new().expect("tempdir");
    let docs = temp.path().join("extracted_text");
    let path = write_doc(&docs, "a.txt", "alpha beta").await;
    let config = stub_config(temp.path());

    let mut indexer = CorpusIndexer::new(&config).expect("indexer");
    indexer.rebuild_from_dir(&docs).await.expect("rebuild");
    let chunks_path = config.storage_dir.join("chunks.json");
    tokio::fs::write(&chunks_path, b"not json")
        .await
        .expect("corrupt chunks");

    let err = indexer.update_file(&path).await.expect_err("load failure");
    assert!(matches!(
        err,
        IndexerError::VectorStoreError(VectorStoreError::Inconsistent(_))
    ));
    let on_disk = tokio::fs::read(&chunks_path).await.expect("read chunks");
    assert_eq!(on_disk, b"not json");
}

#[tokio::test]
async fn update_of_missing_file_reports_not_found() {
    let temp = TempDir::new().expect("tempdir");
    let config = stub_config(temp.path());
    let mut indexer = CorpusIndexer::new(&config).expect("indexer");

    let err = indexer
        .update_file(temp.path().join("missing.txt"))
        .await
        .expect_err("missing");
    assert!(matches!(
        err,
        IndexerError::VectorStoreError(VectorStoreError::NotFound(_))
    ));
    assert!(!config.storage_dir.join("store_info.json").exists());
}

#[tokio::test]
async fn update_file_matches_documents_however_the_path_is_spelled() {
    let temp = TempDir::new().expect("tempdir");
    let docs = temp.path().join("extracted_text");
    write_doc(&docs, "a.txt", "alpha beta").await;
    let config = stub_config(temp.path());

    let mut indexer = CorpusIndexer::new(&config).expect("indexer");
    indexer
        .rebuild_from_dir(docs.join("."))
        .await
        .expect("rebuild through dotted dir");

    write_doc(&docs, "a.txt", "gamma delta").await;
    indexer
        .update_file(docs.join(".").join("a.txt"))
        .await
        .expect("update through alias");

    let key = docs.join("a.txt").to_string_lossy().into_owned();
    assert_eq!(indexer.store().document_chunk_ids(&key), &[1]);
    let stats = indexer.stats();
    assert_eq!(stats.unique_documents, 1);
    assert_eq!(stats.total_chunks, 1);
}

#[tokio::test]
async fn update_file_completes_a_save_cut_short_between_renames() {
    let temp = TempDir::new().expect("tempdir");
    let docs = temp.path().join("extracted_text");
    write_doc(&docs, "a.txt", "alpha beta").await;
    let config = stub_config(temp.path());
    let mut indexer = CorpusIndexer::new(&config).expect("indexer");
    indexer.rebuild_from_dir(&docs).await.expect("first rebuild");

    write_doc(&docs, "b.txt", "hostel rules").await;
    let scratch = StoreConfig {
        storage_dir: temp.path().join("scratch"),
        ..stub_config(temp.path())
    };
    CorpusIndexer::new(&scratch)
        .expect("scratch indexer")
        .rebuild_from_dir(&docs)
        .await
        .expect("second rebuild");

    // Index renamed into place; the rest of the second generation still staged
    let store = &config.storage_dir;
    for (name, target) in [
        ("index.bin", "index.bin"),
        ("chunks.json", "chunks.json.tmp"),
        ("manifest.json", "manifest.json.tmp"),
        ("store_info.json", "store_info.json.tmp"),
    ] {
        tokio::fs::copy(scratch.storage_dir.join(name), store.join(target))
            .await
            .expect("stage artifact");
    }
    let err = CorpusIndexer::read_only(&config)
        .expect("reader")
        .load()
        .await
        .expect_err("torn store");
    assert!(matches!(
        err,
        IndexerError::VectorStoreError(VectorStoreError::Inconsistent(_))
    ));

    write_doc(&docs, "a.txt", "gamma delta").await;
    indexer
        .update_file(docs.join("a.txt"))
        .await
        .expect("update after torn save");

    let key = docs.join("a.txt").to_string_lossy().into_owned();
    assert_eq!(indexer.store().document_chunk_ids(&key), &[2]);
    let stats = indexer.stats();
    assert_eq!(stats.unique_documents, 2);
    assert_eq!(stats.total_chunks, 2);
    assert!(!store.join("store_info.json.tmp").exists());
}
