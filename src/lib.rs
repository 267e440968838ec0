//! # download-batch
//!
//! Status aggregation and lifecycle management for batches of downloads.
//!
//! A batch groups several downloads under one title. Its status is not set
//! directly by callers: it is derived from the statuses of its downloads and
//! written back whenever one of them changes.
//!
//! ## Design Philosophy
//!
//! download-batch is designed to be:
//! - **Store-backed** - Every service talks to one SQLite database, nothing is cached
//! - **Library-first** - The REST API is optional; the services are plain Rust types
//! - **Event-driven** - Consumers subscribe to batch events, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use download_batch::{BatchManager, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = BatchManager::new(Config::default()).await?;
//!
//!     // Subscribe to events
//!     let mut events = manager.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     // Report download status changes as they happen
//!     let status = manager
//!         .on_download_status_changed(download_batch::DownloadId(1))
//!         .await?;
//!     println!("batch is now {}", status);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Batch status derivation from download statuses
pub mod aggregator;
/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Database persistence layer
pub mod db;
/// Deletion of batches flagged for removal
pub mod deletion;
/// Error types
pub mod error;
/// Per-batch status writes, cancellation and start tracking
pub mod lifecycle;
/// Batch manager facade (decomposed into focused submodules)
pub mod manager;
/// Batch row queries
pub mod query;
/// Batch assembly from rows and downloads
pub mod retrieval;
/// Download and batch status codes
pub mod status;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use aggregator::{BatchStatusAggregator, StatusTally, aggregate_statuses};
pub use config::{ApiConfig, Config, EventConfig, PersistenceConfig};
pub use db::{BatchRow, Database};
pub use deletion::{BatchDeletionCascade, DownloadDeleter, FileDownloadDeleter};
pub use error::{
    ApiError, BatchError, DatabaseError, Error, ErrorDetail, Result, ToHttpStatus,
};
pub use lifecycle::{BatchLifecycleManager, BatchLocks, StatusChange};
pub use manager::BatchManager;
pub use query::{BatchQuery, QueryArgument};
pub use retrieval::BatchRetrieval;
pub use status::Status;
pub use types::{Batch, BatchId, BatchInfo, DownloadId, DownloadInfo, Event, Visibility};
