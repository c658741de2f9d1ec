use crate::{IndexerError, Result};
use corpus_vector_store::StoreLayout;
use fs2::FileExt;
use std::time::Instant;

/// Exclusive cross-process write lock on one storage directory, released on
/// drop. Readers never take it.
pub struct IndexWriteLock {
    file: std::fs::File,
}

impl Drop for IndexWriteLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

/// Block until no other writer holds `<storage_dir>/index.lock`.
pub async fn acquire_index_write_lock(layout: &StoreLayout) -> Result<IndexWriteLock> {
    tokio::fs::create_dir_all(layout.dir()).await?;
    let path = layout.lock_path();

    tokio::task::spawn_blocking(move || -> Result<IndexWriteLock> {
        use std::fs::OpenOptions;

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|err| IndexerError::Lock(format!("open {}: {err}", path.display())))?;

        if file.try_lock_exclusive().is_err() {
            log::info!("Waiting for another writer to release {}", path.display());
            let start = Instant::now();
            file.lock_exclusive().map_err(|err| {
                IndexerError::Lock(format!("acquire {}: {err}", path.display()))
            })?;
            log::debug!(
                "Acquired {} after {} ms",
                path.display(),
                start.elapsed().as_millis()
            );
        }

        Ok(IndexWriteLock { file })
    })
    .await
    .map_err(|err| IndexerError::Lock(format!("join index lock task: {err}")))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn creates_lock_file_and_reacquires_after_drop() {
        let tmp = TempDir::new().unwrap();
        let layout = StoreLayout::new(tmp.path().join("store"));

        let lock = acquire_index_write_lock(&layout).await.unwrap();
        assert!(layout.lock_path().exists());
        drop(lock);

        let _again = acquire_index_write_lock(&layout).await.unwrap();
    }

    #[tokio::test]
    async fn second_writer_waits_for_the_first() {
        let tmp = TempDir::new().unwrap();
        let layout = StoreLayout::new(tmp.path());

        let held = acquire_index_write_lock(&layout).await.unwrap();
        let waiting = {
            let layout = layout.clone();
            tokio::spawn(async move { acquire_index_write_lock(&layout).await })
        };

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!waiting.is_finished());

        drop(held);
        let acquired = tokio::time::timeout(Duration::from_secs(5), waiting)
            .await
            .expect("lock released")
            .unwrap();
        assert!(acquired.is_ok());
    }
}
