use crate::db::*;
use crate::status::Status;
use crate::types::{BatchId, BatchInfo, DownloadId};
use tempfile::NamedTempFile;

mod close;

/// Open a fresh database backed by a temp file
///
/// The temp file must outlive the database, so both are returned.
async fn open_temp_db() -> (Database, NamedTempFile) {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();
    (db, temp_file)
}

async fn insert_test_batch(db: &Database, title: &str) -> BatchId {
    db.insert_batch(&NewBatch {
        info: BatchInfo {
            title: title.to_string(),
            ..Default::default()
        },
        status: Status::Pending,
    })
    .await
    .unwrap()
}

async fn insert_test_download(db: &Database, batch_id: BatchId, status: Status) -> DownloadId {
    db.insert_download(&NewDownload {
        batch_id,
        uri: format!("https://example.com/{}/file.bin", batch_id),
        local_path: None,
        status,
        total_bytes: 100,
    })
    .await
    .unwrap()
}
