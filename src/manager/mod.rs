//! The batch manager facade, split into focused submodules.
//!
//! [`BatchManager`] wires the four batch services over one shared database
//! and broadcasts an [`Event`] for every observable batch transition:
//! - [`transitions`] - Reactions to download status changes and failures
//! - [`control`] - Start, cancel, unlock and removal of batches

mod control;
mod transitions;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

use crate::aggregator::BatchStatusAggregator;
use crate::config::Config;
use crate::db::Database;
use crate::deletion::{BatchDeletionCascade, DownloadDeleter, FileDownloadDeleter};
use crate::error::Result;
use crate::lifecycle::BatchLifecycleManager;
use crate::retrieval::BatchRetrieval;
use crate::types::Event;
use std::sync::Arc;

/// Main batch manager instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct BatchManager {
    /// Database instance for persistence (wrapped in Arc for sharing across services)
    pub(crate) db: Arc<Database>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    pub(crate) aggregator: BatchStatusAggregator,
    pub(crate) lifecycle: BatchLifecycleManager,
    pub(crate) retrieval: BatchRetrieval,
    pub(crate) deletion: BatchDeletionCascade,
}

impl BatchManager {
    /// Create a new BatchManager instance
    ///
    /// Opens (or creates) the SQLite database, runs migrations, and sets up
    /// the event broadcast channel. Downloads of removed batches are deleted
    /// by a [`FileDownloadDeleter`].
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let db = Arc::new(Database::open(&config.persistence).await?);
        let deleter: Arc<dyn DownloadDeleter> = Arc::new(FileDownloadDeleter::new(Arc::clone(&db)));
        Ok(Self::from_parts(db, config, deleter))
    }

    /// Create a BatchManager that removes downloads through `deleter`
    pub async fn with_deleter(config: Config, deleter: Arc<dyn DownloadDeleter>) -> Result<Self> {
        config.validate()?;
        let db = Arc::new(Database::open(&config.persistence).await?);
        Ok(Self::from_parts(db, config, deleter))
    }

    /// Assemble the services over an already opened database
    pub(crate) fn from_parts(
        db: Arc<Database>,
        config: Config,
        deleter: Arc<dyn DownloadDeleter>,
    ) -> Self {
        let (event_tx, _rx) = tokio::sync::broadcast::channel(config.events.channel_capacity);

        tracing::info!(
            database = %config.persistence.database_path.display(),
            "batch manager initialized"
        );

        Self {
            aggregator: BatchStatusAggregator::new(Arc::clone(&db)),
            lifecycle: BatchLifecycleManager::new(Arc::clone(&db)),
            retrieval: BatchRetrieval::new(Arc::clone(&db)),
            deletion: BatchDeletionCascade::new(Arc::clone(&db), deleter),
            db,
            event_tx,
            config: Arc::new(config),
        }
    }

    /// Subscribe to batch events
    ///
    /// Multiple subscribers are supported. Each subscriber receives all events independently.
    /// If a subscriber falls behind by more than `events.channel_capacity` events,
    /// it will receive a `RecvError::Lagged` error.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use download_batch::{BatchManager, Config};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let manager = BatchManager::new(Config::default()).await?;
    ///
    ///     let mut events = manager.subscribe();
    ///     tokio::spawn(async move {
    ///         while let Ok(event) = events.recv().await {
    ///             tracing::info!(?event, "batch event");
    ///         }
    ///     });
    ///
    ///     Ok(())
    /// }
    /// ```
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Status derivation service
    pub fn aggregator(&self) -> &BatchStatusAggregator {
        &self.aggregator
    }

    /// Status write and lifecycle service
    pub fn lifecycle(&self) -> &BatchLifecycleManager {
        &self.lifecycle
    }

    /// Batch read service
    pub fn retrieval(&self) -> &BatchRetrieval {
        &self.retrieval
    }

    /// Deletion cascade service
    pub fn deletion(&self) -> &BatchDeletionCascade {
        &self.deletion
    }

    /// Shared database handle
    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    /// Emit an event to all subscribers
    ///
    /// If there are no active subscribers, the event is silently dropped.
    pub(crate) fn emit_event(&self, event: Event) {
        // send() returns Err if there are no receivers, which is fine - we just drop the event
        self.event_tx.send(event).ok();
    }

    /// Spawn the REST API server in a background task
    ///
    /// The server listens on the configured bind address (default: 127.0.0.1:6790).
    pub fn spawn_api_server(self: &Arc<Self>) -> tokio::task::JoinHandle<Result<()>> {
        let manager = Arc::clone(self);
        let config = Arc::clone(&self.config);

        tokio::spawn(async move { crate::api::start_api_server(manager, config).await })
    }
}
