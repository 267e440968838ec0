//! Database layer for download-batch
//!
//! Handles SQLite persistence for batches and their downloads.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`] - Database lifecycle, schema migrations
//! - [`batches`] - Batch rows, status writes and the soft-delete flag
//! - [`downloads`] - Download rows and bulk status writes per batch

use crate::status::Status;
use crate::types::{BatchId, BatchInfo, DownloadId, DownloadInfo, Visibility};
use serde::Serialize;
use sqlx::{FromRow, sqlite::SqlitePool};
use std::path::PathBuf;
use utoipa::ToSchema;

mod batches;
mod downloads;
mod migrations;

/// SQLite's default `SQLITE_MAX_VARIABLE_NUMBER`
const MAX_BIND_VARIABLES: usize = 999;

/// New batch to be inserted into the database
#[derive(Debug, Clone)]
pub struct NewBatch {
    /// Caller-supplied metadata
    pub info: BatchInfo,
    /// Initial status (usually [`Status::Pending`])
    pub status: Status,
}

/// Batch record from the `batches_with_sizes` view
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, ToSchema)]
pub struct BatchRow {
    /// Unique database ID
    pub id: BatchId,
    /// Display title
    pub title: String,
    /// Longer description
    pub description: Option<String>,
    /// Image shown alongside the batch notification
    pub big_picture_url: Option<String>,
    /// Visibility code (see [`Visibility`])
    pub visibility: i32,
    /// Opaque caller data
    pub extra_data: Option<String>,
    /// Persisted batch status
    pub status: Status,
    /// Whether the batch has been started at least once
    pub has_started: bool,
    /// Soft-delete flag, cleared by the deletion cascade
    pub deleted: bool,
    /// Unix timestamp in milliseconds of the last status write
    pub last_modification: i64,
    /// Sum of member download sizes
    pub total_size_bytes: i64,
    /// Sum of bytes downloaded across members
    pub current_size_bytes: i64,
}

impl BatchRow {
    /// Metadata portion of the row
    pub fn info(&self) -> BatchInfo {
        BatchInfo {
            title: self.title.clone(),
            description: self.description.clone(),
            big_picture_url: self.big_picture_url.clone(),
            visibility: Visibility::from_code(self.visibility),
            extra_data: self.extra_data.clone(),
        }
    }
}

/// New download to be inserted into the database
#[derive(Debug, Clone)]
pub struct NewDownload {
    /// Owning batch
    pub batch_id: BatchId,
    /// Source location
    pub uri: String,
    /// Where the artifact will be written
    pub local_path: Option<String>,
    /// Initial status
    pub status: Status,
    /// Total size in bytes (0 = unknown)
    pub total_bytes: i64,
}

/// Download record from database
#[derive(Debug, Clone, FromRow)]
pub struct DownloadRow {
    /// Unique database ID
    pub id: DownloadId,
    /// Owning batch
    pub batch_id: BatchId,
    /// Source location
    pub uri: String,
    /// Where the artifact is written
    pub local_path: Option<String>,
    /// Current status
    pub status: Status,
    /// Total size in bytes
    pub total_bytes: i64,
    /// Bytes downloaded so far
    pub current_bytes: i64,
    /// Unix timestamp when the download was created
    pub created_at: i64,
}

impl From<DownloadRow> for DownloadInfo {
    fn from(row: DownloadRow) -> Self {
        DownloadInfo {
            id: row.id,
            batch_id: row.batch_id,
            uri: row.uri,
            local_path: row.local_path.map(PathBuf::from),
            status: row.status,
            total_bytes: row.total_bytes.max(0) as u64,
            current_bytes: row.current_bytes.max(0) as u64,
        }
    }
}

/// Database handle for download-batch
pub struct Database {
    pool: SqlitePool,
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
