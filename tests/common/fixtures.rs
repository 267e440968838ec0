//! Batch and download fixtures

use download_batch::db::{NewBatch, NewDownload};
use download_batch::{BatchId, BatchInfo, BatchManager, DownloadId, Status};
use std::path::Path;

/// Insert a pending batch with one download per status
pub async fn seed_batch(
    manager: &BatchManager,
    title: &str,
    statuses: &[Status],
) -> (BatchId, Vec<DownloadId>) {
    let db = manager.database();
    let batch_id = db
        .insert_batch(&NewBatch {
            info: BatchInfo {
                title: title.to_string(),
                description: Some(format!("{} downloads", statuses.len())),
                ..Default::default()
            },
            status: Status::Pending,
        })
        .await
        .unwrap();

    let mut ids = Vec::with_capacity(statuses.len());
    for (i, status) in statuses.iter().enumerate() {
        let id = db
            .insert_download(&NewDownload {
                batch_id,
                uri: format!("https://downloads.example.com/{}/part{}", title, i),
                local_path: None,
                status: *status,
                total_bytes: 4096,
            })
            .await
            .unwrap();
        ids.push(id);
    }

    (batch_id, ids)
}

/// Insert a batch whose downloads have been written to `dir`
///
/// Returns the batch id and the paths of the files on disk.
pub async fn seed_batch_with_files(
    manager: &BatchManager,
    title: &str,
    files: usize,
    dir: &Path,
) -> (BatchId, Vec<std::path::PathBuf>) {
    let (batch_id, _) = seed_batch(manager, title, &[]).await;

    let mut paths = Vec::with_capacity(files);
    for i in 0..files {
        let path = dir.join(format!("{}-{}.bin", title, i));
        tokio::fs::write(&path, vec![0u8; 16]).await.unwrap();
        manager
            .database()
            .insert_download(&NewDownload {
                batch_id,
                uri: format!("https://downloads.example.com/{}/{}.bin", title, i),
                local_path: Some(path.to_string_lossy().into_owned()),
                status: Status::Success,
                total_bytes: 16,
            })
            .await
            .unwrap();
        paths.push(path);
    }

    (batch_id, paths)
}

/// Set a download's stored status, as the download engine would
pub async fn set_download_status(manager: &BatchManager, id: DownloadId, status: Status) {
    let updated = manager
        .database()
        .update_download_status(id, status)
        .await
        .unwrap();
    assert_eq!(updated, 1, "download {} should exist", id);
}
