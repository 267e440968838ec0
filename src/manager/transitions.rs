//! Reactions to download status changes reported by the transfer engine.

use crate::error::{BatchError, Error, Result};
use crate::lifecycle::StatusChange;
use crate::status::Status;
use crate::types::{BatchId, DownloadId, Event};

use super::BatchManager;

impl BatchManager {
    /// Recompute the batch of a download whose status was just written
    ///
    /// Emits [`Event::BatchStatusChanged`] when the stored batch status
    /// changed. Returns the batch's new status.
    ///
    /// # Errors
    ///
    /// Returns `BatchError::DownloadNotFound` if the download doesn't exist.
    pub async fn on_download_status_changed(&self, download_id: DownloadId) -> Result<Status> {
        let download = self
            .db
            .get_download(download_id)
            .await?
            .ok_or(BatchError::DownloadNotFound {
                id: download_id.get(),
            })?;

        self.recompute_and_notify(download.batch_id).await
    }

    /// Record a permanent download failure and fail the rest of its batch
    ///
    /// Writes `error_status` to the download, marks every sibling as
    /// [`Status::BatchFailed`] and recomputes the batch.
    ///
    /// # Errors
    ///
    /// - `BatchError::InvalidStatus` if `error_status` is not an error status
    /// - `BatchError::DownloadNotFound` if the download doesn't exist
    pub async fn on_download_failed(
        &self,
        download_id: DownloadId,
        error_status: Status,
    ) -> Result<Status> {
        if !error_status.is_error() {
            return Err(Error::Batch(BatchError::InvalidStatus {
                id: download_id.get(),
                status: error_status,
            }));
        }

        let download = self
            .db
            .get_download(download_id)
            .await?
            .ok_or(BatchError::DownloadNotFound {
                id: download_id.get(),
            })?;

        self.db
            .update_download_status(download_id, error_status)
            .await?;
        tracing::warn!(
            batch_id = download.batch_id.get(),
            download_id = download_id.get(),
            status = %error_status,
            "download failed"
        );

        self.lifecycle
            .set_batch_items_failed(download.batch_id, download_id)
            .await?;

        self.recompute_and_notify(download.batch_id).await
    }

    pub(crate) async fn recompute_and_notify(&self, batch_id: BatchId) -> Result<Status> {
        let change = self.lifecycle.recompute(batch_id).await?;
        let StatusChange { previous, current } = change;

        if change.changed() {
            tracing::info!(
                batch_id = batch_id.get(),
                previous = ?previous,
                status = %current,
                "batch status changed"
            );
            self.emit_event(Event::BatchStatusChanged {
                batch_id,
                previous,
                status: current,
            });
        }

        Ok(current)
    }
}
