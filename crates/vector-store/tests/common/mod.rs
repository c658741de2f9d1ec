#![allow(dead_code)]

use async_trait::async_trait;
use corpus_vector_store::{
    Chunker, ChunkerConfig, EmbeddingProvider, Result, StubEmbedder, VectorStoreManager,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const VOCABULARY: [&str; 4] = ["admission", "hostel", "library", "exam"];

/// Counts vocabulary hits per dimension, plus a constant bias so no vector is
/// all zeros. Deterministic and meaningful enough to rank simple queries.
pub struct KeywordEmbedder;

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    fn model_name(&self) -> &str {
        "keyword-test"
    }

    fn dimension(&self) -> usize {
        VOCABULARY.len() + 1
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let lower = text.to_lowercase();
        let mut vector: Vec<f32> = VOCABULARY
            .iter()
            .map(|word| lower.matches(word).count() as f32)
            .collect();
        vector.push(1.0);
        Ok(vector)
    }
}

pub fn chunker(chunk_size: usize, overlap: usize) -> Chunker {
    Chunker::new(ChunkerConfig {
        chunk_size,
        overlap,
    })
    .expect("valid chunker config")
}

pub fn keyword_store(dir: &Path) -> VectorStoreManager {
    VectorStoreManager::new(dir, chunker(4, 1), Arc::new(KeywordEmbedder))
}

pub fn stub_store(dir: &Path) -> VectorStoreManager {
    VectorStoreManager::new(dir, chunker(4, 1), Arc::new(StubEmbedder::new(8)))
}

/// Write an extracted-text file in the scraper's header format.
pub async fn write_doc(dir: &Path, name: &str, title: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    let content = format!("URL: https://example.edu/{name}\nTitle: {title}\n{}\n{body}", "-".repeat(40));
    tokio::fs::write(&path, content).await.expect("write doc");
    path
}
