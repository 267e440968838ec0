//! Assembles [`Batch`] values from batch rows and caller-held downloads.

use crate::Result;
use crate::db::{BatchRow, Database};
use crate::query::BatchQuery;
use crate::types::{Batch, BatchId, DownloadInfo};
use std::collections::HashMap;
use std::sync::Arc;

/// Read-side view over batch rows
#[derive(Clone)]
pub struct BatchRetrieval {
    db: Arc<Database>,
}

impl BatchRetrieval {
    /// Create a retrieval service over `db`
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Every batch in the store, each carrying the supplied downloads that
    /// belong to it
    ///
    /// Downloads are matched by `batch_id` only; the store is not asked for
    /// download rows.
    pub async fn retrieve_batches_for(&self, downloads: &[DownloadInfo]) -> Result<Vec<Batch>> {
        let rows = self.db.list_batches().await?;

        let mut by_batch: HashMap<BatchId, Vec<DownloadInfo>> = HashMap::new();
        for download in downloads {
            by_batch
                .entry(download.batch_id)
                .or_default()
                .push(download.clone());
        }

        let batches = rows
            .into_iter()
            .map(|row| {
                let members = by_batch.remove(&row.id).unwrap_or_default();
                into_batch(row, members)
            })
            .collect();

        Ok(batches)
    }

    /// The batch owning `download`, or [`Batch::deleted`] if its row is gone
    ///
    /// Only `download` itself is attached.
    pub async fn retrieve_batch_for(&self, download: &DownloadInfo) -> Result<Batch> {
        match self.db.get_batch(download.batch_id).await? {
            Some(row) => Ok(into_batch(row, vec![download.clone()])),
            None => {
                tracing::debug!(
                    batch_id = download.batch_id.get(),
                    download_id = download.id.get(),
                    "batch row missing, returning deleted placeholder"
                );
                Ok(Batch::deleted())
            }
        }
    }

    /// Filtered, sorted read of batch rows
    pub async fn retrieve_for(&self, query: &BatchQuery) -> Result<Vec<BatchRow>> {
        self.db.query_batches(query).await
    }
}

fn into_batch(row: BatchRow, downloads: Vec<DownloadInfo>) -> Batch {
    Batch {
        id: row.id,
        info: row.info(),
        downloads,
        status: row.status,
        total_size_bytes: row.total_size_bytes.max(0) as u64,
        current_size_bytes: row.current_size_bytes.max(0) as u64,
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{NewBatch, NewDownload};
    use crate::status::Status;
    use crate::types::{BatchInfo, DownloadId};
    use tempfile::NamedTempFile;

    async fn setup() -> (BatchRetrieval, Arc<Database>, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let db = Arc::new(Database::new(temp_file.path()).await.unwrap());
        (BatchRetrieval::new(Arc::clone(&db)), db, temp_file)
    }

    async fn insert_batch(db: &Database, title: &str) -> BatchId {
        db.insert_batch(&NewBatch {
            info: BatchInfo {
                title: title.into(),
                ..Default::default()
            },
            status: Status::Pending,
        })
        .await
        .unwrap()
    }

    fn held_download(id: i64, batch_id: BatchId) -> DownloadInfo {
        DownloadInfo {
            id: DownloadId(id),
            batch_id,
            uri: format!("https://example.com/{id}"),
            local_path: None,
            status: Status::Running,
            total_bytes: 0,
            current_bytes: 0,
        }
    }

    #[tokio::test]
    async fn batches_carry_only_their_downloads() {
        let (retrieval, db, _tmp) = setup().await;
        let a = insert_batch(&db, "A").await;
        let b = insert_batch(&db, "B").await;

        let held = vec![
            held_download(1, a),
            held_download(2, b),
            held_download(3, a),
            // Belongs to no stored batch
            held_download(4, BatchId(999)),
        ];

        let batches = retrieval.retrieve_batches_for(&held).await.unwrap();
        assert_eq!(batches.len(), 2);

        let batch_a = batches.iter().find(|batch| batch.id == a).unwrap();
        let ids: Vec<i64> = batch_a.downloads.iter().map(|d| d.id.get()).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(batch_a.info.title, "A");

        let batch_b = batches.iter().find(|batch| batch.id == b).unwrap();
        assert_eq!(batch_b.downloads.len(), 1);
    }

    #[tokio::test]
    async fn batch_sizes_come_from_store() {
        let (retrieval, db, _tmp) = setup().await;
        let a = insert_batch(&db, "Sized").await;
        db.insert_download(&NewDownload {
            batch_id: a,
            uri: "https://example.com/big".into(),
            local_path: None,
            status: Status::Running,
            total_bytes: 500,
        })
        .await
        .unwrap();

        let batches = retrieval.retrieve_batches_for(&[]).await.unwrap();
        assert_eq!(batches[0].total_size_bytes, 500);
        assert!(batches[0].downloads.is_empty());
    }

    #[tokio::test]
    async fn missing_batch_yields_deleted_placeholder() {
        let (retrieval, _db, _tmp) = setup().await;

        let batch = retrieval
            .retrieve_batch_for(&held_download(1, BatchId(31)))
            .await
            .unwrap();
        assert!(batch.is_deleted());
    }

    #[tokio::test]
    async fn single_batch_attaches_the_download() {
        let (retrieval, db, _tmp) = setup().await;
        let a = insert_batch(&db, "Single").await;

        let batch = retrieval
            .retrieve_batch_for(&held_download(8, a))
            .await
            .unwrap();
        assert_eq!(batch.id, a);
        assert_eq!(batch.downloads.len(), 1);
        assert_eq!(batch.status, Status::Pending);
    }

    #[tokio::test]
    async fn retrieve_for_applies_query() {
        let (retrieval, db, _tmp) = setup().await;
        let a = insert_batch(&db, "A").await;
        let b = insert_batch(&db, "B").await;
        db.mark_batches_deleted(&[a]).await.unwrap();

        let rows = retrieval
            .retrieve_for(&BatchQuery::default().with_deleted(false).sort_by_id())
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, b);
    }
}
