//! Shared test helpers for creating BatchManager instances in tests.

use crate::config::Config;
use crate::db::{NewBatch, NewDownload};
use crate::manager::BatchManager;
use crate::status::Status;
use crate::types::{BatchId, BatchInfo, DownloadId};
use tempfile::tempdir;

/// Helper to create a test BatchManager with a persistent database.
/// Returns the manager and the tempdir (which must be kept alive).
pub(crate) async fn create_test_manager() -> (BatchManager, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();

    let mut config = Config::default();
    config.persistence.database_path = temp_dir.path().join("test.db");
    config.events.channel_capacity = 100;

    let manager = BatchManager::new(config).await.unwrap();
    (manager, temp_dir)
}

/// Insert a batch with one download per status
pub(crate) async fn seed_batch(
    manager: &BatchManager,
    title: &str,
    statuses: &[Status],
) -> (BatchId, Vec<DownloadId>) {
    let db = manager.database();
    let batch_id = db
        .insert_batch(&NewBatch {
            info: BatchInfo {
                title: title.to_string(),
                ..Default::default()
            },
            status: Status::Pending,
        })
        .await
        .unwrap();

    let mut download_ids = Vec::with_capacity(statuses.len());
    for (i, status) in statuses.iter().enumerate() {
        let id = db
            .insert_download(&NewDownload {
                batch_id,
                uri: format!("https://example.com/{}/{}", title, i),
                local_path: None,
                status: *status,
                total_bytes: 1000,
            })
            .await
            .unwrap();
        download_ids.push(id);
    }

    (batch_id, download_ids)
}
