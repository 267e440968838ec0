//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`batches`] - Batch inspection and lifecycle control
//! - [`system`] - Health and OpenAPI

use crate::query::BatchQuery;
use crate::status::Status;
use crate::types::BatchId;
use serde::{Deserialize, Serialize};

mod batches;
mod system;

// Re-export all handlers so `routes::function_name` continues to work
pub use batches::*;
pub use system::*;

// ============================================================================
// Query/Request Types (shared across handlers)
// ============================================================================

/// Sort orders accepted by GET /batches
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BatchSort {
    /// Most recently modified first
    #[default]
    LastModifiedDesc,
    /// Least recently modified first
    LastModifiedAsc,
    /// Ascending batch id
    Id,
}

/// Query parameters for GET /batches
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ListBatchesQuery {
    /// Only batches with this stored status
    pub status: Option<Status>,
    /// Only batches with this deletion flag
    pub deleted: Option<bool>,
    /// Sort order (default: last_modified_desc)
    pub sort: Option<BatchSort>,
}

impl ListBatchesQuery {
    /// Render the parameters into a [`BatchQuery`]
    pub fn to_batch_query(&self) -> BatchQuery {
        let mut query = BatchQuery::default();
        if let Some(status) = self.status {
            query = query.with_status(status);
        }
        if let Some(deleted) = self.deleted {
            query = query.with_deleted(deleted);
        }
        match self.sort.unwrap_or_default() {
            BatchSort::LastModifiedDesc => query.sort_by_last_modified(true),
            BatchSort::LastModifiedAsc => query.sort_by_last_modified(false),
            BatchSort::Id => query.sort_by_id(),
        }
    }
}

/// Response body for GET /batches/:id/status
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct BatchStatusResponse {
    /// Status persisted on the batch row
    pub stored: Status,
    /// Status derived from the batch's downloads right now
    pub derived: Status,
}

/// Response body for POST /batches/:id/start
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct StartBatchResponse {
    /// Whether this call was the batch's first start
    pub first_start: bool,
}

/// Request body for POST /batches/pending
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct UnlockBatchesRequest {
    /// Batches to set back to pending
    pub batch_ids: Vec<BatchId>,
}

/// Response body for POST /batches/pending
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct UnlockBatchesResponse {
    /// Number of batches updated
    pub updated: u64,
}

/// Response body for POST /batches/cleanup
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CleanupResponse {
    /// Ids of the batches that were deleted
    pub deleted: Vec<BatchId>,
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_query_sorts_newest_first() {
        let query = ListBatchesQuery::default().to_batch_query();
        assert_eq!(query.selection, None);
        assert_eq!(query.sort_order.as_deref(), Some("last_modification DESC"));
    }

    #[test]
    fn filters_are_rendered_into_selection() {
        let query = ListBatchesQuery {
            status: Some(Status::Running),
            deleted: Some(false),
            sort: Some(BatchSort::Id),
        }
        .to_batch_query();

        assert_eq!(query.selection_arguments.len(), 2);
        assert!(query.selection.as_deref().unwrap().contains(" AND "));
        assert_eq!(query.sort_order.as_deref(), Some("id ASC"));
    }
}
