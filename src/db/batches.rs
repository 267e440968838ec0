//! Batch row CRUD, status writes and the soft-delete flag.

use crate::error::DatabaseError;
use crate::query::{BatchQuery, QueryArgument};
use crate::status::Status;
use crate::types::BatchId;
use crate::{Error, Result};

use super::{BatchRow, Database, MAX_BIND_VARIABLES, NewBatch};

const BATCH_COLUMNS: &str = r#"
    id, title, description, big_picture_url, visibility, extra_data,
    status, has_started, deleted, last_modification,
    total_size_bytes, current_size_bytes
"#;

impl Database {
    /// Insert a new batch record
    pub async fn insert_batch(&self, batch: &NewBatch) -> Result<BatchId> {
        let now = chrono::Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO batches (
                title, description, big_picture_url, visibility, extra_data,
                status, has_started, deleted, last_modification, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, 0, 0, ?, ?)
            "#,
        )
        .bind(&batch.info.title)
        .bind(&batch.info.description)
        .bind(&batch.info.big_picture_url)
        .bind(batch.info.visibility.code())
        .bind(&batch.info.extra_data)
        .bind(batch.status)
        .bind(now.timestamp_millis())
        .bind(now.timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to insert batch: {}",
                e
            )))
        })?;

        Ok(BatchId(result.last_insert_rowid()))
    }

    /// Get a batch by ID, including its size sums
    pub async fn get_batch(&self, id: BatchId) -> Result<Option<BatchRow>> {
        let sql = format!("SELECT {} FROM batches_with_sizes WHERE id = ?", BATCH_COLUMNS);

        let row = sqlx::query_as::<_, BatchRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to get batch: {}",
                    e
                )))
            })?;

        Ok(row)
    }

    /// List all batches, including their size sums
    pub async fn list_batches(&self) -> Result<Vec<BatchRow>> {
        self.query_batches(&BatchQuery::default()).await
    }

    /// Run a filtered, sorted read over the `batches_with_sizes` view
    ///
    /// Selection, arguments and sort order are passed through unmodified.
    pub async fn query_batches(&self, query: &BatchQuery) -> Result<Vec<BatchRow>> {
        let mut sql = format!("SELECT {} FROM batches_with_sizes", BATCH_COLUMNS);
        if let Some(selection) = &query.selection {
            sql.push_str(" WHERE ");
            sql.push_str(selection);
        }
        if let Some(sort_order) = &query.sort_order {
            sql.push_str(" ORDER BY ");
            sql.push_str(sort_order);
        }

        let mut statement = sqlx::query_as::<_, BatchRow>(&sql);
        for argument in &query.selection_arguments {
            statement = match argument {
                QueryArgument::Integer(value) => statement.bind(*value),
                QueryArgument::Text(value) => statement.bind(value.as_str()),
            };
        }

        let rows = statement.fetch_all(&self.pool).await.map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to query batches: {}",
                e
            )))
        })?;

        Ok(rows)
    }

    /// Get the persisted status of a batch, `None` if the row doesn't exist
    pub async fn get_batch_status(&self, id: BatchId) -> Result<Option<Status>> {
        let status = sqlx::query_scalar::<_, Status>("SELECT status FROM batches WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to get batch status: {}",
                    e
                )))
            })?;

        Ok(status)
    }

    /// Get the started flag of a batch, `None` if the row doesn't exist
    pub async fn get_batch_has_started(&self, id: BatchId) -> Result<Option<bool>> {
        let started = sqlx::query_scalar::<_, bool>("SELECT has_started FROM batches WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to get batch started flag: {}",
                    e
                )))
            })?;

        Ok(started)
    }

    /// Write a batch status and advance its last modification time
    ///
    /// `last_modification` never moves backwards: the stored value becomes
    /// the larger of the old value and `now_millis`. Returns rows updated.
    pub async fn update_batch_status(
        &self,
        id: BatchId,
        status: Status,
        now_millis: i64,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE batches
            SET status = ?, last_modification = MAX(last_modification, ?)
            WHERE id = ?
            "#,
        )
        .bind(status)
        .bind(now_millis)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to update batch status: {}",
                e
            )))
        })?;

        Ok(result.rows_affected())
    }

    /// Set the status of every listed batch
    ///
    /// Chunks the ids to stay within SQLite's bind variable limit; all chunks
    /// commit together. Returns the number of rows updated.
    pub async fn update_batches_status(&self, ids: &[BatchId], status: Status) -> Result<u64> {
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
        // One bind variable is taken by the status
        for chunk in ids.chunks(MAX_BIND_VARIABLES - 1) {
            let mut query_builder: sqlx::QueryBuilder<sqlx::Sqlite> =
                sqlx::QueryBuilder::new("UPDATE batches SET status = ");
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
                        "Failed to update batches status: {}",
                        e
                    )))
                })?;
            updated += result.rows_affected();
        }

        tx.commit().await.map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to commit batches status update: {}",
                e
            )))
        })?;

        Ok(updated)
    }

    /// Mark a batch as started
    pub async fn set_batch_started(&self, id: BatchId) -> Result<u64> {
        let result = sqlx::query("UPDATE batches SET has_started = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to mark batch started: {}",
                    e
                )))
            })?;

        Ok(result.rows_affected())
    }

    /// Set the soft-delete flag on every listed batch
    pub async fn mark_batches_deleted(&self, ids: &[BatchId]) -> Result<u64> {
        self.execute_for_ids("UPDATE batches SET deleted = 1 WHERE id IN (", ids, "mark batches deleted")
            .await
    }

    /// IDs of every batch carrying the soft-delete flag
    pub async fn list_batch_ids_marked_deleted(&self) -> Result<Vec<BatchId>> {
        let ids = sqlx::query_scalar::<_, BatchId>(
            "SELECT id FROM batches WHERE deleted = 1 ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to list deleted batches: {}",
                e
            )))
        })?;

        Ok(ids)
    }

    /// Delete every listed batch row that no download row refers to
    ///
    /// Batches that still own downloads are skipped and keep their flags.
    pub async fn delete_batches(&self, ids: &[BatchId]) -> Result<u64> {
        self.execute_for_ids(
            "DELETE FROM batches WHERE NOT EXISTS \
             (SELECT 1 FROM downloads WHERE downloads.batch_id = batches.id) \
             AND id IN (",
            ids,
            "delete batches",
        )
        .await
    }

    /// Run `prefix <ids>)` over `ids` in chunks, inside one transaction
    async fn execute_for_ids(&self, prefix: &str, ids: &[BatchId], action: &str) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await.map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to begin transaction: {}",
                e
            )))
        })?;

        let mut affected = 0;
        for chunk in ids.chunks(MAX_BIND_VARIABLES) {
            let mut query_builder: sqlx::QueryBuilder<sqlx::Sqlite> = sqlx::QueryBuilder::new(prefix);
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
                        "Failed to {}: {}",
                        action, e
                    )))
                })?;
            affected += result.rows_affected();
        }

        tx.commit().await.map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to commit {}: {}",
                action, e
            )))
        })?;

        Ok(affected)
    }
}
