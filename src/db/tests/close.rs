use super::{insert_test_batch, open_temp_db};
use crate::status::Status;

/// Verify that querying the database after closing the pool returns an error
/// rather than hanging or panicking.
#[tokio::test]
async fn test_get_batch_after_pool_close_returns_error() {
    let (db, _temp_file) = open_temp_db().await;

    let id = insert_test_batch(&db, "Closing").await;

    let before = db.get_batch(id).await.unwrap();
    assert!(before.is_some(), "batch should exist before close");

    // Close the pool (but keep the Database struct alive)
    db.pool().close().await;

    let result = db.get_batch(id).await;
    assert!(
        result.is_err(),
        "get_batch after pool close should return an error, got: {:?}",
        result
    );
}

/// Verify that status writes after closing the pool surface as errors
#[tokio::test]
async fn test_update_batch_status_after_pool_close_returns_error() {
    let (db, _temp_file) = open_temp_db().await;
    let id = insert_test_batch(&db, "Closing").await;

    db.pool().close().await;

    let result = db.update_batch_status(id, Status::Running, 1).await;
    assert!(
        matches!(
            result,
            Err(crate::Error::Database(crate::error::DatabaseError::QueryFailed(_)))
        ),
        "expected a query failure, got: {:?}",
        result
    );
}

/// Verify that listing downloads after closing the pool returns an error
#[tokio::test]
async fn test_list_downloads_after_pool_close_returns_error() {
    let (db, _temp_file) = open_temp_db().await;

    db.pool().close().await;

    let result = db.list_downloads().await;
    assert!(
        result.is_err(),
        "list_downloads after pool close should return an error, got: {:?}",
        result
    );
}
