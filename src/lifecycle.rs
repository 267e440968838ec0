//! Batch lifecycle: status writes, cancellation, failure propagation and the
//! started flag.
//!
//! Status writes for one batch are serialized through [`BatchLocks`] so a
//! derive-then-write recompute can't interleave with another write to the
//! same batch. Different batches never contend.

use crate::Result;
use crate::aggregator::BatchStatusAggregator;
use crate::db::Database;
use crate::status::Status;
use crate::types::{BatchId, DownloadId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-batch async locks
///
/// Entries are created on demand and pruned once nobody holds or waits on
/// them.
#[derive(Default)]
pub struct BatchLocks {
    inner: Mutex<HashMap<BatchId, Arc<Mutex<()>>>>,
}

impl BatchLocks {
    /// Create an empty lock map
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `batch_id`
    ///
    /// The returned guard releases the lock when dropped.
    pub async fn lock(&self, batch_id: BatchId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            // Only the map itself references an idle entry
            map.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(
                map.entry(batch_id)
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };

        lock.lock_owned().await
    }

    /// Number of batches with a live lock entry
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    /// Whether no batch currently has a lock entry
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Persisted status before and after a recompute
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusChange {
    /// Status stored before the recompute, `None` if the batch row is missing
    pub previous: Option<Status>,
    /// Freshly derived status
    pub current: Status,
}

impl StatusChange {
    /// Whether the stored status actually changed
    pub fn changed(&self) -> bool {
        self.previous != Some(self.current)
    }
}

/// Writes batch and member-download statuses
#[derive(Clone)]
pub struct BatchLifecycleManager {
    db: Arc<Database>,
    aggregator: BatchStatusAggregator,
    locks: Arc<BatchLocks>,
}

impl BatchLifecycleManager {
    /// Create a lifecycle manager over `db`
    pub fn new(db: Arc<Database>) -> Self {
        let aggregator = BatchStatusAggregator::new(Arc::clone(&db));
        Self {
            db,
            aggregator,
            locks: Arc::new(BatchLocks::new()),
        }
    }

    /// Write a batch status and refresh its last modification time
    ///
    /// Downloads are not touched.
    pub async fn update_batch_status(&self, batch_id: BatchId, status: Status) -> Result<()> {
        let _guard = self.locks.lock(batch_id).await;
        self.write_status(batch_id, status).await
    }

    /// Persisted status of a batch, `None` if the batch doesn't exist
    pub async fn get_batch_status(&self, batch_id: BatchId) -> Result<Option<Status>> {
        self.db.get_batch_status(batch_id).await
    }

    /// Set every download of a batch to [`Status::Canceled`]
    ///
    /// Returns the number of downloads updated.
    pub async fn set_batch_items_cancelled(&self, batch_id: BatchId) -> Result<u64> {
        self.db
            .update_downloads_status_for_batch(batch_id, Status::Canceled, None)
            .await
    }

    /// Cancel a batch and all of its downloads
    pub async fn cancel_batch(&self, batch_id: BatchId) -> Result<()> {
        let _guard = self.locks.lock(batch_id).await;

        let cancelled = self.set_batch_items_cancelled(batch_id).await?;
        self.write_status(batch_id, Status::Canceled).await?;

        tracing::info!(
            batch_id = batch_id.get(),
            count = cancelled,
            "batch cancelled"
        );
        Ok(())
    }

    /// Mark every download of a batch except `excluded` as [`Status::BatchFailed`]
    ///
    /// Returns the number of downloads updated.
    pub async fn set_batch_items_failed(
        &self,
        batch_id: BatchId,
        excluded: DownloadId,
    ) -> Result<u64> {
        let failed = self
            .db
            .update_downloads_status_for_batch(batch_id, Status::BatchFailed, Some(excluded))
            .await?;

        tracing::info!(
            batch_id = batch_id.get(),
            download_id = excluded.get(),
            count = failed,
            "propagated failure to sibling downloads"
        );
        Ok(failed)
    }

    /// Force every listed batch back to [`Status::Pending`]
    ///
    /// Returns the number of batches updated; ids without a row are skipped.
    pub async fn update_batches_to_pending_status(&self, batch_ids: &[BatchId]) -> Result<u64> {
        self.db
            .update_batches_status(batch_ids, Status::Pending)
            .await
    }

    /// Whether the batch has never been started
    ///
    /// A batch without a row reads as not started.
    pub async fn is_batch_starting_for_the_first_time(&self, batch_id: BatchId) -> Result<bool> {
        let started = self.db.get_batch_has_started(batch_id).await?;
        Ok(!started.unwrap_or(false))
    }

    /// Record that the batch has started
    pub async fn mark_batch_as_started(&self, batch_id: BatchId) -> Result<()> {
        self.db.set_batch_started(batch_id).await?;
        Ok(())
    }

    /// Derive the batch status from its downloads and store it
    pub async fn recompute_batch_status(&self, batch_id: BatchId) -> Result<Status> {
        Ok(self.recompute(batch_id).await?.current)
    }

    /// Derive and store the batch status, reporting what was stored before
    pub async fn recompute(&self, batch_id: BatchId) -> Result<StatusChange> {
        let _guard = self.locks.lock(batch_id).await;

        let previous = self.db.get_batch_status(batch_id).await?;
        let current = self.aggregator.derive_batch_status(batch_id).await?;
        self.write_status(batch_id, current).await?;

        tracing::debug!(
            batch_id = batch_id.get(),
            previous = ?previous,
            status = %current,
            "recomputed batch status"
        );

        Ok(StatusChange { previous, current })
    }

    /// The lock map shared by every clone of this manager
    pub fn locks(&self) -> &Arc<BatchLocks> {
        &self.locks
    }

    // Caller holds the batch lock.
    async fn write_status(&self, batch_id: BatchId, status: Status) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis();
        self.db.update_batch_status(batch_id, status, now).await?;
        Ok(())
    }
}
