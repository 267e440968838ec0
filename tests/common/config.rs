//! Test configuration helpers for creating throwaway batch managers

use download_batch::{BatchManager, Config, DownloadDeleter};
use std::sync::Arc;
use tempfile::TempDir;

/// Config whose database lives inside `temp_dir`
pub fn test_config(temp_dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.persistence.database_path = temp_dir.path().join("batches.db");
    config.events.channel_capacity = 256;
    config
}

/// Create a BatchManager over a fresh database
///
/// Returns the manager and the temp directory (which must be kept alive).
pub async fn create_test_manager() -> (BatchManager, TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();
    let manager = BatchManager::new(test_config(&temp_dir)).await.unwrap();
    (manager, temp_dir)
}

/// Create a BatchManager that removes downloads through `deleter`
pub async fn create_test_manager_with_deleter(
    deleter: Arc<dyn DownloadDeleter>,
) -> (BatchManager, TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();
    let manager = BatchManager::with_deleter(test_config(&temp_dir), deleter)
        .await
        .unwrap();
    (manager, temp_dir)
}
