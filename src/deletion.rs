//! Removal of batches flagged as deleted, together with their downloads.
//!
//! A flagged batch row outlives its downloads: it is removed only after the
//! deleter cleared every download row that refers to it.

use crate::Result;
use crate::db::Database;
use crate::types::{BatchId, DownloadInfo};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

/// Removes one download's artifact and row
///
/// Implementations decide what "the artifact" is. [`FileDownloadDeleter`]
/// removes the file at [`DownloadInfo::local_path`].
#[async_trait]
pub trait DownloadDeleter: Send + Sync {
    /// Delete the download's file (if any) and its row
    async fn delete_file_and_row(&self, download: &DownloadInfo) -> Result<()>;
}

/// Deletes the local file, then the download row
pub struct FileDownloadDeleter {
    db: Arc<Database>,
}

impl FileDownloadDeleter {
    /// Create a deleter that removes rows from `db`
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DownloadDeleter for FileDownloadDeleter {
    async fn delete_file_and_row(&self, download: &DownloadInfo) -> Result<()> {
        if let Some(path) = &download.local_path {
            match tokio::fs::remove_file(path).await {
                Ok(()) => {
                    tracing::debug!(
                        download_id = download.id.get(),
                        path = %path.display(),
                        "removed download file"
                    );
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        self.db.delete_download(download.id).await
    }
}

/// Deletes batches carrying the soft-delete flag
#[derive(Clone)]
pub struct BatchDeletionCascade {
    db: Arc<Database>,
    deleter: Arc<dyn DownloadDeleter>,
}

impl BatchDeletionCascade {
    /// Create a cascade over `db` that removes downloads through `deleter`
    pub fn new(db: Arc<Database>, deleter: Arc<dyn DownloadDeleter>) -> Self {
        Self { db, deleter }
    }

    /// Delete every flagged batch, handing its known downloads to the deleter
    /// first
    ///
    /// `downloads` is the caller's view of all downloads; those belonging to a
    /// flagged batch are passed to the deleter one by one. A deleter failure
    /// is logged and does not stop the cascade, but the failing batch is left
    /// flagged. A batch row is removed only once no download row refers to
    /// it, so downloads the caller did not know about keep their batch (and
    /// their files stay tracked) until a later pass hands them over.
    ///
    /// Returns the ids of the batches that were deleted.
    pub async fn delete_marked_batches_for(
        &self,
        downloads: &[DownloadInfo],
    ) -> Result<Vec<BatchId>> {
        let marked = self.db.list_batch_ids_marked_deleted().await?;
        if marked.is_empty() {
            return Ok(marked);
        }

        let marked_set: HashSet<BatchId> = marked.iter().copied().collect();
        let mut failed = HashSet::new();
        for download in downloads
            .iter()
            .filter(|download| marked_set.contains(&download.batch_id))
        {
            if let Err(e) = self.deleter.delete_file_and_row(download).await {
                tracing::warn!(
                    batch_id = download.batch_id.get(),
                    download_id = download.id.get(),
                    error = %e,
                    "failed to delete download of removed batch"
                );
                failed.insert(download.batch_id);
            }
        }

        let candidates: Vec<BatchId> = marked
            .iter()
            .copied()
            .filter(|id| !failed.contains(id))
            .collect();
        let count = self.db.delete_batches(&candidates).await?;

        let still_marked: HashSet<BatchId> = self
            .db
            .list_batch_ids_marked_deleted()
            .await?
            .into_iter()
            .collect();
        let (kept, deleted): (Vec<BatchId>, Vec<BatchId>) = marked
            .into_iter()
            .partition(|id| still_marked.contains(id));

        for batch_id in &kept {
            tracing::warn!(
                batch_id = batch_id.get(),
                "batch still owns downloads, left for the next cleanup"
            );
        }

        tracing::info!(count, kept = kept.len(), "deleted marked batches");
        Ok(deleted)
    }
}
