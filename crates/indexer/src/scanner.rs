use corpus_vector_store::{load_document, Document};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extension of extracted-text documents
pub const DOCUMENT_EXTENSION: &str = "txt";

/// Documents read from a directory, plus one message per file that failed
#[derive(Debug, Default)]
pub struct LoadedDocuments {
    pub documents: Vec<Document>,
    pub errors: Vec<String>,
}

/// `*.txt` files directly inside `dir`, sorted by path so chunk ids are
/// assigned in a stable order. Hidden files are skipped. A missing directory
/// yields nothing.
pub fn scan_documents(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        log::warn!("Document directory {} does not exist", dir.display());
        return Vec::new();
    }

    let mut files = Vec::new();
    for result in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        match result {
            Ok(entry) => {
                if !entry.file_type().is_file() {
                    continue;
                }
                let path = entry.path();
                if is_hidden(path) {
                    log::debug!("Skipping hidden file {}", path.display());
                    continue;
                }
                if !is_document_file(path) {
                    continue;
                }
                files.push(entry.into_path());
            }
            Err(e) => log::warn!("Failed to read entry: {e}"),
        }
    }

    log::info!("Found {} documents in {}", files.len(), dir.display());
    files
}

/// Load every document `scan_documents` finds. A file that cannot be read or
/// decoded is logged and recorded in `errors`; it never aborts the batch.
pub async fn load_documents(dir: &Path) -> LoadedDocuments {
    let mut loaded = LoadedDocuments::default();
    for path in scan_documents(dir) {
        match load_document(&path).await {
            Ok(doc) => loaded.documents.push(doc),
            Err(err) => {
                log::warn!("Skipping {}: {err}", path.display());
                loaded.errors.push(format!("{}: {err}", path.display()));
            }
        }
    }
    loaded
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

fn is_document_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(DOCUMENT_EXTENSION))
}
