//! Download and batch status codes
//!
//! Downloads and batches share one closed set of status codes. The persisted
//! representation is the integer [`Status::code`]; anything that does not map
//! to a known code is read back as [`Status::UnknownError`].

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Status of a download or of a batch
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Files are being removed
    Deleting,
    /// A pause was requested and the transfer is winding down
    Pausing,
    /// Accepted by the submission path but not yet queued
    Submitted,
    /// Queued and waiting to start (also the administrative re-queue marker)
    Pending,
    /// Transfer in progress
    Running,
    /// Paused on request of the embedding application
    PausedByApp,
    /// Waiting before retrying after a transient failure
    WaitingToRetry,
    /// Waiting for network connectivity
    WaitingForNetwork,
    /// Waiting for an unmetered connection
    QueuedForWifi,
    /// Held back by client-side download restrictions
    QueuedDueClientRestrictions,
    /// Not enough space to store the file; the download waits for space
    InsufficientSpaceError,
    /// No storage device available; the download waits for one to appear
    DeviceNotFoundError,
    /// Finished successfully
    Success,
    /// Server rejected the request
    BadRequest,
    /// Server cannot produce an acceptable response
    NotAcceptable,
    /// Server requires a content length
    LengthRequired,
    /// A request precondition failed
    PreconditionFailed,
    /// Destination file already exists
    FileAlreadyExistsError,
    /// Transfer cannot be resumed from its partial state
    CannotResume,
    /// Cancelled by the user or application
    Canceled,
    /// Failed for an unclassified reason
    UnknownError,
    /// Local storage error
    FileError,
    /// Redirect could not be followed
    UnhandledRedirect,
    /// Unexpected HTTP response code
    UnhandledHttpCode,
    /// Error while receiving data
    HttpDataError,
    /// Transport-level failure
    HttpException,
    /// Redirect limit exceeded
    TooManyRedirects,
    /// Blocked by policy
    Blocked,
    /// Failed because a sibling download in the same batch failed
    BatchFailed,
}

/// Aggregation precedence, highest first. The first status present in a
/// batch wins.
pub const PRIORITISED_STATUSES: [Status; 12] = [
    Status::Canceled,
    Status::Pausing,
    Status::PausedByApp,
    Status::Running,
    Status::Deleting,
    // paused
    Status::QueuedDueClientRestrictions,
    Status::WaitingToRetry,
    Status::WaitingForNetwork,
    Status::QueuedForWifi,
    Status::Submitted,
    Status::Pending,
    Status::Success,
];

/// Statuses whose presence means a batch of finished and submitted items is
/// not simply "still enqueuing". `Pausing` is deliberately absent.
pub const STATUSES_EXCEPT_SUCCESS_SUBMITTED: [Status; 9] = [
    Status::Canceled,
    Status::PausedByApp,
    Status::Running,
    Status::Deleting,
    // paused
    Status::QueuedDueClientRestrictions,
    Status::WaitingToRetry,
    Status::WaitingForNetwork,
    Status::QueuedForWifi,
    Status::Pending,
];

impl Status {
    /// Convert a persisted status code to a Status
    pub fn from_code(code: i32) -> Self {
        match code {
            185 => Status::Deleting,
            186 => Status::Pausing,
            189 => Status::Submitted,
            190 => Status::Pending,
            192 => Status::Running,
            193 => Status::PausedByApp,
            194 => Status::WaitingToRetry,
            195 => Status::WaitingForNetwork,
            196 => Status::QueuedForWifi,
            197 => Status::QueuedDueClientRestrictions,
            198 => Status::InsufficientSpaceError,
            199 => Status::DeviceNotFoundError,
            200 => Status::Success,
            400 => Status::BadRequest,
            406 => Status::NotAcceptable,
            411 => Status::LengthRequired,
            412 => Status::PreconditionFailed,
            488 => Status::FileAlreadyExistsError,
            489 => Status::CannotResume,
            490 => Status::Canceled,
            492 => Status::FileError,
            493 => Status::UnhandledRedirect,
            494 => Status::UnhandledHttpCode,
            495 => Status::HttpDataError,
            496 => Status::HttpException,
            497 => Status::TooManyRedirects,
            498 => Status::Blocked,
            499 => Status::BatchFailed,
            _ => Status::UnknownError,
        }
    }

    /// Persisted status code
    pub fn code(self) -> i32 {
        match self {
            Status::Deleting => 185,
            Status::Pausing => 186,
            Status::Submitted => 189,
            Status::Pending => 190,
            Status::Running => 192,
            Status::PausedByApp => 193,
            Status::WaitingToRetry => 194,
            Status::WaitingForNetwork => 195,
            Status::QueuedForWifi => 196,
            Status::QueuedDueClientRestrictions => 197,
            Status::InsufficientSpaceError => 198,
            Status::DeviceNotFoundError => 199,
            Status::Success => 200,
            Status::BadRequest => 400,
            Status::NotAcceptable => 406,
            Status::LengthRequired => 411,
            Status::PreconditionFailed => 412,
            Status::FileAlreadyExistsError => 488,
            Status::CannotResume => 489,
            Status::Canceled => 490,
            Status::UnknownError => 491,
            Status::FileError => 492,
            Status::UnhandledRedirect => 493,
            Status::UnhandledHttpCode => 494,
            Status::HttpDataError => 495,
            Status::HttpException => 496,
            Status::TooManyRedirects => 497,
            Status::Blocked => 498,
            Status::BatchFailed => 499,
        }
    }

    /// Whether this status is a permanent failure
    ///
    /// Only codes from 400 up count. The storage conditions 198 and 199 are
    /// recoverable and stay out of both the error and the priority classes.
    pub fn is_error(self) -> bool {
        matches!(
            self,
            Status::BadRequest
                | Status::NotAcceptable
                | Status::LengthRequired
                | Status::PreconditionFailed
                | Status::FileAlreadyExistsError
                | Status::CannotResume
                | Status::UnknownError
                | Status::FileError
                | Status::UnhandledRedirect
                | Status::UnhandledHttpCode
                | Status::HttpDataError
                | Status::HttpException
                | Status::TooManyRedirects
                | Status::Blocked
                | Status::BatchFailed
        )
    }

    /// Whether this status can be forced onto rows outside of aggregation
    pub fn is_administrative(self) -> bool {
        matches!(self, Status::Pending | Status::BatchFailed)
    }

    /// Upper-case name, as used in logs
    pub fn name(self) -> &'static str {
        match self {
            Status::Deleting => "DELETING",
            Status::Pausing => "PAUSING",
            Status::Submitted => "SUBMITTED",
            Status::Pending => "PENDING",
            Status::Running => "RUNNING",
            Status::PausedByApp => "PAUSED_BY_APP",
            Status::WaitingToRetry => "WAITING_TO_RETRY",
            Status::WaitingForNetwork => "WAITING_FOR_NETWORK",
            Status::QueuedForWifi => "QUEUED_FOR_WIFI",
            Status::QueuedDueClientRestrictions => "QUEUED_DUE_CLIENT_RESTRICTIONS",
            Status::InsufficientSpaceError => "INSUFFICIENT_SPACE_ERROR",
            Status::DeviceNotFoundError => "DEVICE_NOT_FOUND_ERROR",
            Status::Success => "SUCCESS",
            Status::BadRequest => "BAD_REQUEST",
            Status::NotAcceptable => "NOT_ACCEPTABLE",
            Status::LengthRequired => "LENGTH_REQUIRED",
            Status::PreconditionFailed => "PRECONDITION_FAILED",
            Status::FileAlreadyExistsError => "FILE_ALREADY_EXISTS_ERROR",
            Status::CannotResume => "CANNOT_RESUME",
            Status::Canceled => "CANCELED",
            Status::UnknownError => "UNKNOWN_ERROR",
            Status::FileError => "FILE_ERROR",
            Status::UnhandledRedirect => "UNHANDLED_REDIRECT",
            Status::UnhandledHttpCode => "UNHANDLED_HTTP_CODE",
            Status::HttpDataError => "HTTP_DATA_ERROR",
            Status::HttpException => "HTTP_EXCEPTION",
            Status::TooManyRedirects => "TOO_MANY_REDIRECTS",
            Status::Blocked => "BLOCKED",
            Status::BatchFailed => "BATCH_FAILED",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// Stored as the integer status code
impl sqlx::Type<sqlx::Sqlite> for Status {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <i32 as sqlx::Type<sqlx::Sqlite>>::type_info()
    }

    fn compatible(ty: &sqlx::sqlite::SqliteTypeInfo) -> bool {
        <i32 as sqlx::Type<sqlx::Sqlite>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for Status {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        sqlx::Encode::<sqlx::Sqlite>::encode_by_ref(&self.code(), buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for Status {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let code = <i32 as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        Ok(Self::from_code(code))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Status; 29] = [
        Status::Deleting,
        Status::Pausing,
        Status::Submitted,
        Status::Pending,
        Status::Running,
        Status::PausedByApp,
        Status::WaitingToRetry,
        Status::WaitingForNetwork,
        Status::QueuedForWifi,
        Status::QueuedDueClientRestrictions,
        Status::InsufficientSpaceError,
        Status::DeviceNotFoundError,
        Status::Success,
        Status::BadRequest,
        Status::NotAcceptable,
        Status::LengthRequired,
        Status::PreconditionFailed,
        Status::FileAlreadyExistsError,
        Status::CannotResume,
        Status::Canceled,
        Status::UnknownError,
        Status::FileError,
        Status::UnhandledRedirect,
        Status::UnhandledHttpCode,
        Status::HttpDataError,
        Status::HttpException,
        Status::TooManyRedirects,
        Status::Blocked,
        Status::BatchFailed,
    ];

    #[test]
    fn codes_are_unique_and_stable() {
        let mut codes: Vec<i32> = ALL.iter().map(|s| s.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), ALL.len());

        for status in ALL {
            assert_eq!(Status::from_code(status.code()), status);
        }
    }

    #[test]
    fn unknown_code_reads_as_unknown_error() {
        assert_eq!(Status::from_code(0), Status::UnknownError);
        assert_eq!(Status::from_code(-7), Status::UnknownError);
        assert_eq!(Status::from_code(191), Status::UnknownError);
        assert!(Status::from_code(12345).is_error());
    }

    #[test]
    fn priority_and_error_classes_are_disjoint() {
        for status in PRIORITISED_STATUSES {
            assert!(!status.is_error(), "{} must not be an error", status);
        }
        for status in ALL {
            if !PRIORITISED_STATUSES.contains(&status) && !is_storage_wait(status) {
                assert!(status.is_error(), "{} is neither class", status);
            }
        }
    }

    fn is_storage_wait(status: Status) -> bool {
        matches!(
            status,
            Status::InsufficientSpaceError | Status::DeviceNotFoundError
        )
    }

    #[test]
    fn storage_waits_are_not_errors() {
        for status in [Status::InsufficientSpaceError, Status::DeviceNotFoundError] {
            assert!(status.code() < 400);
            assert!(!status.is_error(), "{} must not fail the batch", status);
            assert!(!PRIORITISED_STATUSES.contains(&status));
        }
        assert!(Status::BadRequest.is_error());
    }

    #[test]
    fn cancellation_is_not_an_error() {
        assert!(!Status::Canceled.is_error());
        assert!(Status::BatchFailed.is_error());
        assert!(Status::UnknownError.is_error());
    }

    #[test]
    fn administrative_statuses() {
        assert!(Status::Pending.is_administrative());
        assert!(Status::BatchFailed.is_administrative());
        assert!(!Status::Running.is_administrative());
    }

    #[test]
    fn serializes_as_snake_case() {
        assert_eq!(
            serde_json::to_string(&Status::PausedByApp).unwrap(),
            "\"paused_by_app\""
        );
        let parsed: Status = serde_json::from_str("\"batch_failed\"").unwrap();
        assert_eq!(parsed, Status::BatchFailed);
        assert_eq!(Status::QueuedForWifi.to_string(), "QUEUED_FOR_WIFI");
    }
}
