//! Batch control: start, cancel, unlock, removal and cleanup.

use crate::error::Result;
use crate::types::{BatchId, DownloadInfo, Event};
use std::collections::HashSet;

use super::BatchManager;

impl BatchManager {
    /// Start a batch
    ///
    /// The first start of a batch marks it as started, emits
    /// [`Event::BatchStarted`] and returns `true`. Any later call returns
    /// `false` and emits nothing.
    pub async fn start_batch(&self, batch_id: BatchId) -> Result<bool> {
        // Two concurrent starts must not both observe a first start
        let _guard = self.lifecycle.locks().lock(batch_id).await;

        if !self
            .lifecycle
            .is_batch_starting_for_the_first_time(batch_id)
            .await?
        {
            return Ok(false);
        }

        self.lifecycle.mark_batch_as_started(batch_id).await?;
        tracing::info!(batch_id = batch_id.get(), "batch started");
        self.emit_event(Event::BatchStarted { batch_id });

        Ok(true)
    }

    /// Cancel a batch and all of its downloads
    pub async fn cancel_batch(&self, batch_id: BatchId) -> Result<()> {
        self.lifecycle.cancel_batch(batch_id).await?;
        self.emit_event(Event::BatchCancelled { batch_id });
        Ok(())
    }

    /// Force the listed batches back to pending
    ///
    /// Returns the number of batches updated. Ids without a batch row are
    /// skipped and logged.
    pub async fn unlock_batches(&self, batch_ids: &[BatchId]) -> Result<u64> {
        let updated = self
            .lifecycle
            .update_batches_to_pending_status(batch_ids)
            .await?;

        let requested = batch_ids.iter().collect::<HashSet<_>>().len() as u64;
        if updated < requested {
            tracing::warn!(
                count = updated,
                requested,
                "some batches could not be set back to pending"
            );
        } else {
            tracing::info!(count = updated, "batches set back to pending");
        }

        Ok(updated)
    }

    /// Flag the listed batches for deletion
    ///
    /// Rows stay in place until [`BatchManager::delete_marked_batches`] runs.
    /// Returns the number of batches flagged.
    pub async fn remove_batches(&self, batch_ids: &[BatchId]) -> Result<u64> {
        let marked = self.db.mark_batches_deleted(batch_ids).await?;
        tracing::info!(count = marked, "batches marked for deletion");
        Ok(marked)
    }

    /// Delete every flagged batch and its downloads
    ///
    /// Emits [`Event::BatchDeleted`] per removed batch and returns their ids.
    pub async fn delete_marked_batches(&self) -> Result<Vec<BatchId>> {
        let downloads: Vec<DownloadInfo> = self
            .db
            .list_downloads()
            .await?
            .into_iter()
            .map(DownloadInfo::from)
            .collect();

        let deleted = self.deletion.delete_marked_batches_for(&downloads).await?;

        for batch_id in &deleted {
            self.emit_event(Event::BatchDeleted {
                batch_id: *batch_id,
            });
        }

        Ok(deleted)
    }
}
