//! REST API server module
//!
//! Provides an OpenAPI 3.1 compliant REST API for inspecting batches and
//! driving their lifecycle.

use crate::{BatchManager, Config, Result};
use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Batches
/// - `GET /batches` - List batches (filter by `status`, `deleted`; `sort`)
/// - `GET /batches/:id` - Get single batch
/// - `DELETE /batches/:id` - Flag batch for deletion
/// - `GET /batches/:id/status` - Stored and derived status
/// - `POST /batches/:id/start` - Start batch
/// - `POST /batches/:id/cancel` - Cancel batch and its downloads
///
/// ## Batch-Wide Operations
/// - `POST /batches/pending` - Set batches back to pending
/// - `POST /batches/cleanup` - Delete flagged batches
///
/// ## System
/// - `GET /health` - Health check
/// - `GET /openapi.json` - OpenAPI specification
pub fn create_router(manager: Arc<BatchManager>, config: Arc<Config>) -> Router {
    let state = AppState::new(manager, config.clone());

    let router = Router::new()
        // Batches
        .route("/batches", get(routes::list_batches))
        .route(
            "/batches/:id",
            get(routes::get_batch).delete(routes::remove_batch),
        )
        .route("/batches/:id/status", get(routes::get_batch_status))
        .route("/batches/:id/start", post(routes::start_batch))
        .route("/batches/:id/cancel", post(routes::cancel_batch))
        // Batch-Wide Operations
        .route("/batches/pending", post(routes::unlock_batches))
        .route("/batches/cleanup", post(routes::cleanup_batches))
        // System
        .route("/health", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    // Apply CORS middleware if enabled in config
    if config.api.cors_enabled {
        let cors = build_cors_layer(&config.api.cors_origins);
        router.layer(cors)
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// `"*"` (or an empty list) allows any origin.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address.
///
/// Runs until the server stops.
///
/// # Example
///
/// ```no_run
/// use download_batch::{BatchManager, Config};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::default());
/// let manager = Arc::new(BatchManager::new((*config).clone()).await?);
///
/// // Start API server (blocks until shutdown)
/// download_batch::api::start_api_server(manager, config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(manager: Arc<BatchManager>, config: Arc<Config>) -> Result<()> {
    let bind_address = config.api.bind_address;

    tracing::info!(address = %bind_address, "Starting API server");

    let app = create_router(manager, config);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(address = %bind_address, "API server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
