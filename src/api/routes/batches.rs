//! Batch handlers.

use super::{
    BatchStatusResponse, CleanupResponse, ListBatchesQuery, StartBatchResponse,
    UnlockBatchesRequest, UnlockBatchesResponse,
};
use crate::Error;
use crate::api::AppState;
use crate::error::BatchError;
use crate::types::BatchId;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

// Resolve a batch id to an error response when no row exists
async fn ensure_batch_exists(state: &AppState, id: i64) -> Result<(), Response> {
    match state.manager.database().get_batch_status(BatchId(id)).await {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(Error::Batch(BatchError::NotFound { id }).into_response()),
        Err(e) => {
            tracing::error!(batch_id = id, error = %e, "Failed to look up batch");
            Err(e.into_response())
        }
    }
}

/// GET /batches - List batches
#[utoipa::path(
    get,
    path = "/batches",
    tag = "batches",
    params(
        ("status" = Option<crate::status::Status>, Query, description = "Only batches with this stored status"),
        ("deleted" = Option<bool>, Query, description = "Only batches with this deletion flag"),
        ("sort" = Option<super::BatchSort>, Query, description = "Sort order (default: last_modified_desc)")
    ),
    responses(
        (status = 200, description = "Matching batches", body = Vec<crate::db::BatchRow>),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn list_batches(
    State(state): State<AppState>,
    Query(params): Query<ListBatchesQuery>,
) -> Response {
    match state
        .manager
        .retrieval()
        .retrieve_for(&params.to_batch_query())
        .await
    {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to list batches");
            e.into_response()
        }
    }
}

/// GET /batches/:id - Get single batch
#[utoipa::path(
    get,
    path = "/batches/{id}",
    tag = "batches",
    params(
        ("id" = i64, Path, description = "Batch ID")
    ),
    responses(
        (status = 200, description = "Batch row", body = crate::db::BatchRow),
        (status = 404, description = "Batch not found", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn get_batch(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match state.manager.database().get_batch(BatchId(id)).await {
        Ok(Some(row)) => (StatusCode::OK, Json(row)).into_response(),
        Ok(None) => Error::Batch(BatchError::NotFound { id }).into_response(),
        Err(e) => {
            tracing::error!(batch_id = id, error = %e, "Failed to get batch");
            e.into_response()
        }
    }
}

/// GET /batches/:id/status - Stored and derived status
#[utoipa::path(
    get,
    path = "/batches/{id}/status",
    tag = "batches",
    params(
        ("id" = i64, Path, description = "Batch ID")
    ),
    responses(
        (status = 200, description = "Stored and derived status", body = BatchStatusResponse),
        (status = 404, description = "Batch not found", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn get_batch_status(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    let batch_id = BatchId(id);

    let stored = match state.manager.lifecycle().get_batch_status(batch_id).await {
        Ok(Some(status)) => status,
        Ok(None) => return Error::Batch(BatchError::NotFound { id }).into_response(),
        Err(e) => {
            tracing::error!(batch_id = id, error = %e, "Failed to get batch status");
            return e.into_response();
        }
    };

    match state.manager.aggregator().derive_batch_status(batch_id).await {
        Ok(derived) => {
            (StatusCode::OK, Json(BatchStatusResponse { stored, derived })).into_response()
        }
        Err(e) => {
            tracing::error!(batch_id = id, error = %e, "Failed to derive batch status");
            e.into_response()
        }
    }
}

/// POST /batches/:id/start - Start batch
#[utoipa::path(
    post,
    path = "/batches/{id}/start",
    tag = "batches",
    params(
        ("id" = i64, Path, description = "Batch ID")
    ),
    responses(
        (status = 200, description = "Whether this was the first start", body = StartBatchResponse),
        (status = 404, description = "Batch not found", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn start_batch(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    if let Err(response) = ensure_batch_exists(&state, id).await {
        return response;
    }

    match state.manager.start_batch(BatchId(id)).await {
        Ok(first_start) => {
            (StatusCode::OK, Json(StartBatchResponse { first_start })).into_response()
        }
        Err(e) => {
            tracing::error!(batch_id = id, error = %e, "Failed to start batch");
            e.into_response()
        }
    }
}

/// POST /batches/:id/cancel - Cancel batch and all of its downloads
#[utoipa::path(
    post,
    path = "/batches/{id}/cancel",
    tag = "batches",
    params(
        ("id" = i64, Path, description = "Batch ID")
    ),
    responses(
        (status = 204, description = "Batch cancelled"),
        (status = 404, description = "Batch not found", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn cancel_batch(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    if let Err(response) = ensure_batch_exists(&state, id).await {
        return response;
    }

    match state.manager.cancel_batch(BatchId(id)).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            tracing::error!(batch_id = id, error = %e, "Failed to cancel batch");
            e.into_response()
        }
    }
}

/// DELETE /batches/:id - Flag batch for deletion
#[utoipa::path(
    delete,
    path = "/batches/{id}",
    tag = "batches",
    params(
        ("id" = i64, Path, description = "Batch ID")
    ),
    responses(
        (status = 204, description = "Batch flagged for deletion"),
        (status = 404, description = "Batch not found", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn remove_batch(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match state.manager.remove_batches(&[BatchId(id)]).await {
        Ok(0) => Error::Batch(BatchError::NotFound { id }).into_response(),
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            tracing::error!(batch_id = id, error = %e, "Failed to remove batch");
            e.into_response()
        }
    }
}

/// POST /batches/pending - Set batches back to pending
#[utoipa::path(
    post,
    path = "/batches/pending",
    tag = "batches",
    request_body = UnlockBatchesRequest,
    responses(
        (status = 200, description = "Number of batches updated", body = UnlockBatchesResponse),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn unlock_batches(
    State(state): State<AppState>,
    Json(request): Json<UnlockBatchesRequest>,
) -> Response {
    match state.manager.unlock_batches(&request.batch_ids).await {
        Ok(updated) => (StatusCode::OK, Json(UnlockBatchesResponse { updated })).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to set batches back to pending");
            e.into_response()
        }
    }
}

/// POST /batches/cleanup - Delete flagged batches
#[utoipa::path(
    post,
    path = "/batches/cleanup",
    tag = "batches",
    responses(
        (status = 200, description = "Ids of deleted batches", body = CleanupResponse),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn cleanup_batches(State(state): State<AppState>) -> Response {
    match state.manager.delete_marked_batches().await {
        Ok(deleted) => (StatusCode::OK, Json(CleanupResponse { deleted })).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to delete marked batches");
            e.into_response()
        }
    }
}
