//! Download row CRUD and bulk status writes.

use crate::error::DatabaseError;
use crate::status::Status;
use crate::types::{BatchId, DownloadId};
use crate::{Error, Result};

use super::{Database, DownloadRow, MAX_BIND_VARIABLES, NewDownload};

impl Database {
    /// Insert a new download record
    pub async fn insert_download(&self, download: &NewDownload) -> Result<DownloadId> {
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO downloads (
                batch_id, uri, local_path, status, total_bytes, current_bytes, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(download.batch_id)
        .bind(&download.uri)
        .bind(&download.local_path)
        .bind(download.status)
        .bind(download.total_bytes)
        .bind(0i64) // current_bytes
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let message = format!("Failed to insert download: {}", e);
            match e.as_database_error() {
                Some(db_err) if db_err.is_foreign_key_violation() => {
                    Error::Database(DatabaseError::ConstraintViolation(message))
                }
                _ => Error::Database(DatabaseError::QueryFailed(message)),
            }
        })?;

        Ok(DownloadId(result.last_insert_rowid()))
    }

    /// Get a download by ID
    pub async fn get_download(&self, id: DownloadId) -> Result<Option<DownloadRow>> {
        let row = sqlx::query_as::<_, DownloadRow>(
            r#"
            SELECT
                id, batch_id, uri, local_path, status,
                total_bytes, current_bytes, created_at
            FROM downloads
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get download: {}",
                e
            )))
        })?;

        Ok(row)
    }

    /// List all downloads
    pub async fn list_downloads(&self) -> Result<Vec<DownloadRow>> {
        let rows = sqlx::query_as::<_, DownloadRow>(
            r#"
            SELECT
                id, batch_id, uri, local_path, status,
                total_bytes, current_bytes, created_at
            FROM downloads
            ORDER BY batch_id ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to list downloads: {}",
                e
            )))
        })?;

        Ok(rows)
    }

    /// List the downloads of one batch
    pub async fn list_downloads_for_batch(&self, batch_id: BatchId) -> Result<Vec<DownloadRow>> {
        let rows = sqlx::query_as::<_, DownloadRow>(
            r#"
            SELECT
                id, batch_id, uri, local_path, status,
                total_bytes, current_bytes, created_at
            FROM downloads
            WHERE batch_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(batch_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to list downloads for batch: {}",
                e
            )))
        })?;

        Ok(rows)
    }

    /// Statuses of every download in a batch
    pub async fn query_download_statuses(&self, batch_id: BatchId) -> Result<Vec<Status>> {
        let statuses =
            sqlx::query_scalar::<_, Status>("SELECT status FROM downloads WHERE batch_id = ? ORDER BY id ASC")
                .bind(batch_id)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| {
                    Error::Database(DatabaseError::QueryFailed(format!(
                        "Failed to query download statuses: {}",
                        e
                    )))
                })?;

        Ok(statuses)
    }

    /// Update download status
    pub async fn update_download_status(&self, id: DownloadId, status: Status) -> Result<u64> {
        let result = sqlx::query("UPDATE downloads SET status = ? WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to update download status: {}",
                    e
                )))
            })?;

        Ok(result.rows_affected())
    }

    /// Update download progress
    pub async fn update_download_progress(
        &self,
        id: DownloadId,
        current_bytes: i64,
        total_bytes: i64,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE downloads
            SET current_bytes = ?, total_bytes = ?
            WHERE id = ?
            "#,
        )
        .bind(current_bytes)
        .bind(total_bytes)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to update download progress: {}",
                e
            )))
        })?;

        Ok(())
    }

    /// IDs of every download still in [`Status::Submitted`], in id order
    pub async fn list_submitted_download_ids(&self) -> Result<Vec<DownloadId>> {
        let ids = sqlx::query_scalar::<_, DownloadId>(
            "SELECT id FROM downloads WHERE status = ? ORDER BY id ASC",
        )
        .bind(Status::Submitted)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to list submitted downloads: {}",
                e
            )))
        })?;

        Ok(ids)
    }

    /// Set `status` on every listed download
    ///
    /// Unknown ids are skipped; the count of updated rows is returned.
    pub async fn update_downloads_status(&self, ids: &[DownloadId], status: Status) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await.map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to begin transaction: {}",
                e
            )))
        })?;

        let mut updated = 0;
        for chunk in ids.chunks(MAX_BIND_VARIABLES - 1) {
            let mut query_builder: sqlx::QueryBuilder<sqlx::Sqlite> =
                sqlx::QueryBuilder::new("UPDATE downloads SET status = ");
            query_builder.push_bind(status);
            query_builder.push(" WHERE id IN (");
            let mut separated = query_builder.separated(", ");
            for id in chunk {
                separated.push_bind(*id);
            }
            separated.push_unseparated(")");

            let result = query_builder
                .build()
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    Error::Database(DatabaseError::QueryFailed(format!(
                        "Failed to update downloads status: {}",
                        e
                    )))
                })?;
            updated += result.rows_affected();
        }

        tx.commit().await.map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to commit downloads status update: {}",
                e
            )))
        })?;

        Ok(updated)
    }

    /// Set the status of every download in a batch, optionally sparing one
    ///
    /// Returns the number of rows updated.
    pub async fn update_downloads_status_for_batch(
        &self,
        batch_id: BatchId,
        status: Status,
        excluded: Option<DownloadId>,
    ) -> Result<u64> {
        let result = match excluded {
            Some(excluded) => {
                sqlx::query("UPDATE downloads SET status = ? WHERE batch_id = ? AND id <> ?")
                    .bind(status)
                    .bind(batch_id)
                    .bind(excluded)
                    .execute(&self.pool)
                    .await
            }
            None => {
                sqlx::query("UPDATE downloads SET status = ? WHERE batch_id = ?")
                    .bind(status)
                    .bind(batch_id)
                    .execute(&self.pool)
                    .await
            }
        }
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to update downloads status for batch: {}",
                e
            )))
        })?;

        Ok(result.rows_affected())
    }

    /// Delete a download
    pub async fn delete_download(&self, id: DownloadId) -> Result<()> {
        sqlx::query("DELETE FROM downloads WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to delete download: {}",
                    e
                )))
            })?;

        Ok(())
    }
}
