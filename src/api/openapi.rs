//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the download-batch REST
//! API using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the download-batch REST API
///
/// Served as JSON at `/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "download-batch REST API",
        version = "0.1.0",
        description = "REST API for inspecting download batches and driving their lifecycle",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:6790", description = "Local development server")
    ),
    paths(
        // Batches
        crate::api::routes::list_batches,
        crate::api::routes::get_batch,
        crate::api::routes::get_batch_status,
        crate::api::routes::start_batch,
        crate::api::routes::cancel_batch,
        crate::api::routes::remove_batch,

        // Batch-Wide Operations
        crate::api::routes::unlock_batches,
        crate::api::routes::cleanup_batches,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        // Core types
        crate::status::Status,
        crate::types::BatchId,
        crate::types::DownloadId,
        crate::types::Visibility,
        crate::db::BatchRow,

        // API request/response types from routes
        crate::api::routes::BatchSort,
        crate::api::routes::BatchStatusResponse,
        crate::api::routes::StartBatchResponse,
        crate::api::routes::UnlockBatchesRequest,
        crate::api::routes::UnlockBatchesResponse,
        crate::api::routes::CleanupResponse,

        // Error types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "batches", description = "Batch management - Inspect, start, cancel, unlock and delete batches"),
        (name = "system", description = "System endpoints - Health checks and OpenAPI spec"),
    )
)]
pub struct ApiDoc;
