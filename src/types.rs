//! Core types for download-batch

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use utoipa::ToSchema;

use crate::status::Status;

/// Unique identifier for a batch
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct BatchId(pub i64);

impl BatchId {
    /// Get the inner i64 value
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for BatchId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for BatchId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Unique identifier for a single download
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct DownloadId(pub i64);

impl DownloadId {
    /// Get the inner i64 value
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for DownloadId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for DownloadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Notification visibility of a batch
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Shown while running, dismissed on completion
    #[default]
    Visible,
    /// Shown while running and after completion
    VisibleNotifyCompleted,
    /// Never shown
    Hidden,
    /// Only shown once the batch completes
    VisibleNotifyOnlyCompletion,
}

impl Visibility {
    /// Convert a persisted visibility code
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Visibility::VisibleNotifyCompleted,
            2 => Visibility::Hidden,
            3 => Visibility::VisibleNotifyOnlyCompletion,
            _ => Visibility::Visible,
        }
    }

    /// Persisted visibility code
    pub fn code(self) -> i32 {
        match self {
            Visibility::Visible => 0,
            Visibility::VisibleNotifyCompleted => 1,
            Visibility::Hidden => 2,
            Visibility::VisibleNotifyOnlyCompletion => 3,
        }
    }
}

/// In-memory view of one download, as held by the transfer engine
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DownloadInfo {
    /// Download ID
    pub id: DownloadId,
    /// Owning batch
    pub batch_id: BatchId,
    /// Source location
    pub uri: String,
    /// Downloaded artifact on disk, if any
    #[schema(value_type = Option<String>)]
    pub local_path: Option<PathBuf>,
    /// Current status
    pub status: Status,
    /// Total size in bytes (0 = unknown)
    pub total_bytes: u64,
    /// Bytes downloaded so far
    pub current_bytes: u64,
}

/// Caller-supplied batch metadata
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BatchInfo {
    /// Display title
    pub title: String,
    /// Longer description
    pub description: Option<String>,
    /// Image shown alongside the batch notification
    pub big_picture_url: Option<String>,
    /// Notification visibility
    pub visibility: Visibility,
    /// Opaque data owned by the caller
    pub extra_data: Option<String>,
}

/// A batch together with the downloads the caller holds for it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Batch {
    /// Batch ID
    pub id: BatchId,
    /// Batch metadata
    pub info: BatchInfo,
    /// Member downloads
    pub downloads: Vec<DownloadInfo>,
    /// Persisted batch status
    pub status: Status,
    /// Sum of member download sizes
    pub total_size_bytes: u64,
    /// Sum of bytes downloaded across members
    pub current_size_bytes: u64,
}

impl Batch {
    const DELETED_ID: BatchId = BatchId(-1);

    /// Placeholder returned when a batch row no longer exists
    pub fn deleted() -> Self {
        Self {
            id: Self::DELETED_ID,
            info: BatchInfo {
                visibility: Visibility::Hidden,
                ..Default::default()
            },
            downloads: Vec::new(),
            status: Status::Deleting,
            total_size_bytes: 0,
            current_size_bytes: 0,
        }
    }

    /// Whether this is the [`Batch::deleted`] placeholder
    pub fn is_deleted(&self) -> bool {
        self.id == Self::DELETED_ID
    }
}

/// Event emitted when a batch changes
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// The persisted batch status changed after a recompute
    BatchStatusChanged {
        /// Batch ID
        batch_id: BatchId,
        /// Previous persisted status, if the batch had one
        previous: Option<Status>,
        /// New status
        status: Status,
    },

    /// A batch started for the first time
    BatchStarted {
        /// Batch ID
        batch_id: BatchId,
    },

    /// A batch and all its downloads were cancelled
    BatchCancelled {
        /// Batch ID
        batch_id: BatchId,
    },

    /// A batch and its downloads were removed by the deletion cascade
    BatchDeleted {
        /// Batch ID
        batch_id: BatchId,
    },
}
