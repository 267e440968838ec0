//! Error types for download-batch
//!
//! Store failures, batch state errors and their HTTP mapping. Every error
//! the REST API returns is rendered from [`Error`] through [`ApiError`].

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::status::Status;

/// Result type alias for download-batch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for download-batch
#[derive(Debug, Error)]
pub enum Error {
    /// Rejected configuration value
    #[error("configuration error: {message}")]
    Config {
        /// What is wrong with the value
        message: String,
        /// Dotted path of the offending setting (e.g., "events.channel_capacity")
        key: Option<String>,
    },

    /// Store operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// Batch or download state error
    #[error("batch error: {0}")]
    Batch(#[from] BatchError),

    /// Filesystem error, e.g. while removing a download's file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The REST API server could not bind or serve
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Failure reported by caller code, such as a custom
    /// [`DownloadDeleter`](crate::deletion::DownloadDeleter)
    #[error("{0}")]
    Other(String),
}

/// Store errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Could not open the SQLite file
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Schema migration failed and was rolled back
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Foreign key rejected the write (a download referencing a missing batch)
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Batch and download state errors
#[derive(Debug, Error)]
pub enum BatchError {
    /// Batch does not exist
    #[error("batch {id} not found")]
    NotFound {
        /// The missing batch
        id: i64,
    },

    /// Download does not exist
    #[error("download {id} not found")]
    DownloadNotFound {
        /// The missing download
        id: i64,
    },

    /// Status not valid for the requested transition
    #[error("status {status} is not valid for download {id}")]
    InvalidStatus {
        /// The download the status was meant for
        id: i64,
        /// The rejected status
        status: Status,
    },
}

impl BatchError {
    fn details(&self) -> serde_json::Value {
        match self {
            BatchError::NotFound { id } => serde_json::json!({ "batch_id": id }),
            BatchError::DownloadNotFound { id } => serde_json::json!({ "download_id": id }),
            BatchError::InvalidStatus { id, status } => serde_json::json!({
                "download_id": id,
                "status": status,
            }),
        }
    }
}

/// JSON error body returned by the REST API
///
/// ```json
/// {
///   "error": {
///     "code": "batch_not_found",
///     "message": "batch error: batch 12 not found",
///     "details": { "batch_id": 12 }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error itself
    pub error: ErrorDetail,
}

/// Code, message and optional context of an [`ApiError`]
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable code (e.g., "batch_not_found", "database_error")
    pub code: String,

    /// Human-readable message
    pub message: String,

    /// Ids involved in the failure, when there are any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create an API error without details
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }
}

/// HTTP status and error code of an error
pub trait ToHttpStatus {
    /// HTTP status code to respond with
    fn status_code(&self) -> u16;

    /// Machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            Error::Config { .. } => 400,
            Error::Batch(BatchError::NotFound { .. } | BatchError::DownloadNotFound { .. }) => 404,
            Error::Database(DatabaseError::ConstraintViolation(_)) => 409,
            Error::Batch(BatchError::InvalidStatus { .. }) => 422,
            Error::Database(_) | Error::Io(_) | Error::ApiServerError(_) | Error::Other(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Database(DatabaseError::ConstraintViolation(_)) => "constraint_violation",
            Error::Database(_) => "database_error",
            Error::Batch(BatchError::NotFound { .. }) => "batch_not_found",
            Error::Batch(BatchError::DownloadNotFound { .. }) => "download_not_found",
            Error::Batch(BatchError::InvalidStatus { .. }) => "invalid_status",
            Error::Io(_) => "io_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let mut api = ApiError::new(error.error_code(), error.to_string());
        if let Error::Batch(batch_error) = &error {
            api.error.details = Some(batch_error.details());
        }
        api
    }
}
