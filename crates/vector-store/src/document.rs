use crate::error::{Result, VectorStoreError};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

const URL_PREFIX: &str = "URL: ";
const TITLE_PREFIX: &str = "Title: ";
const UNKNOWN: &str = "Unknown";
const SEPARATOR_MIN_DASHES: usize = 10;

/// Text extracted from one source, ready for chunking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub url: String,
    pub title: String,
    pub text: String,
    pub source_file: String,
}

impl Document {
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        text: impl Into<String>,
        source_file: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            text: text.into(),
            source_file: source_file.into(),
        }
    }
}

/// Manifest key for a document path.
///
/// `.` components and repeated or trailing separators are dropped so every
/// spelling of one file maps to the same key. `..` is kept as written.
#[must_use]
pub fn source_key(path: &Path) -> String {
    path.components()
        .filter(|component| !matches!(component, Component::CurDir))
        .collect::<PathBuf>()
        .to_string_lossy()
        .into_owned()
}

/// Read and parse one extracted-text file.
///
/// Missing files are `NotFound`; content that is not UTF-8 is a
/// `MalformedDocument`.
pub async fn load_document(path: &Path) -> Result<Document> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(VectorStoreError::NotFound(path.display().to_string()));
        }
        Err(err) => return Err(err.into()),
    };
    let content = String::from_utf8(bytes).map_err(|err| VectorStoreError::MalformedDocument {
        path: path.display().to_string(),
        reason: format!("not valid UTF-8: {err}"),
    })?;
    Ok(parse_document(&content, source_key(path)))
}

/// Parse the `URL:` / `Title:` header and the body following the dashed
/// separator line. Without a separator the whole content is the body.
#[must_use]
pub fn parse_document(content: &str, source_file: impl Into<String>) -> Document {
    let lines: Vec<&str> = content.split('\n').collect();

    let url = if content.is_empty() {
        UNKNOWN.to_string()
    } else {
        lines[0].replace(URL_PREFIX, "")
    };
    let title = lines
        .get(1)
        .map_or_else(|| UNKNOWN.to_string(), |line| line.replace(TITLE_PREFIX, ""));

    let separator = "-".repeat(SEPARATOR_MIN_DASHES);
    let text = match lines.iter().position(|line| line.starts_with(&separator)) {
        Some(idx) => lines[idx + 1..].join("\n"),
        None => content.to_string(),
    };

    Document {
        url: url.trim_end_matches('\r').to_string(),
        title: title.trim_end_matches('\r').to_string(),
        text,
        source_file: source_file.into(),
    }
}
