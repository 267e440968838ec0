//! Batch status derivation from member download statuses.
//!
//! A batch has no status of its own beyond what its downloads say:
//! - any error status wins outright
//! - a mix of finished and merely submitted downloads still counts as running
//! - otherwise the highest-precedence status present in
//!   [`PRIORITISED_STATUSES`] wins
//! - a batch with no usable downloads reads as [`Status::UnknownError`]

use crate::Result;
use crate::db::Database;
use crate::status::{PRIORITISED_STATUSES, STATUSES_EXCEPT_SUCCESS_SUBMITTED, Status};
use crate::types::BatchId;
use std::collections::HashMap;
use std::sync::Arc;

/// Per-status counts for one aggregation
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusTally {
    counts: HashMap<Status, usize>,
}

impl StatusTally {
    /// Count one more download in `status`
    pub fn add(&mut self, status: Status) {
        *self.counts.entry(status).or_insert(0) += 1;
    }

    /// Number of downloads counted in `status`
    pub fn count(&self, status: Status) -> usize {
        self.counts.get(&status).copied().unwrap_or(0)
    }

    /// Total downloads counted
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Resolve the tally into a batch status, ignoring error statuses
    pub fn resolve(&self) -> Status {
        if self.is_submitting_remainder() {
            return Status::Running;
        }

        PRIORITISED_STATUSES
            .iter()
            .copied()
            .find(|status| self.count(*status) > 0)
            .unwrap_or(Status::UnknownError)
    }

    // Some downloads finished and the rest are only submitted.
    fn is_submitting_remainder(&self) -> bool {
        self.count(Status::Success) > 0
            && self.count(Status::Submitted) > 0
            && STATUSES_EXCEPT_SUCCESS_SUBMITTED
                .iter()
                .all(|status| self.count(*status) == 0)
    }
}

impl FromIterator<Status> for StatusTally {
    fn from_iter<I: IntoIterator<Item = Status>>(iter: I) -> Self {
        let mut tally = StatusTally::default();
        for status in iter {
            tally.add(status);
        }
        tally
    }
}

/// Aggregate download statuses into one batch status
///
/// Returns the first error status encountered without looking further.
pub fn aggregate_statuses<I>(statuses: I) -> Status
where
    I: IntoIterator<Item = Status>,
{
    let mut tally = StatusTally::default();
    for status in statuses {
        if status.is_error() {
            return status;
        }
        tally.add(status);
    }
    tally.resolve()
}

/// Derives batch statuses from the download rows in the store
#[derive(Clone)]
pub struct BatchStatusAggregator {
    db: Arc<Database>,
}

impl BatchStatusAggregator {
    /// Create an aggregator over `db`
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Derive the status a batch should have from its downloads
    ///
    /// Read-only: nothing is written back.
    pub async fn derive_batch_status(&self, batch_id: BatchId) -> Result<Status> {
        let statuses = self.db.query_download_statuses(batch_id).await?;
        let derived = aggregate_statuses(statuses.iter().copied());

        tracing::trace!(
            batch_id = batch_id.get(),
            downloads = statuses.len(),
            status = %derived,
            "derived batch status"
        );

        Ok(derived)
    }
}
