//! Custom test assertions for integration tests

use download_batch::{BatchId, BatchManager, Event, Status};
use std::time::Duration;
use tokio::sync::broadcast;

/// Result of waiting for an event
#[derive(Debug)]
pub enum WaitResult {
    /// A matching event arrived
    Matched(Event),
    /// Timeout waiting for the event
    Timeout,
    /// Channel closed unexpectedly
    ChannelClosed,
}

/// Wait for the first event satisfying `predicate`
///
/// Lagged receivers skip ahead instead of failing.
pub async fn wait_for_event<F>(
    events: &mut broadcast::Receiver<Event>,
    timeout: Duration,
    predicate: F,
) -> WaitResult
where
    F: Fn(&Event) -> bool,
{
    let result = tokio::time::timeout(timeout, async {
        loop {
            match events.recv().await {
                Ok(event) if predicate(&event) => return WaitResult::Matched(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return WaitResult::ChannelClosed,
            }
        }
    })
    .await;

    result.unwrap_or(WaitResult::Timeout)
}

/// Drain every event already queued on the receiver
pub fn drain_events(events: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}

/// Assert the stored batch status
pub async fn assert_stored_status(manager: &BatchManager, batch_id: BatchId, expected: Status) {
    let stored = manager
        .lifecycle()
        .get_batch_status(batch_id)
        .await
        .unwrap();
    assert_eq!(
        stored,
        Some(expected),
        "batch {} should be stored as {}",
        batch_id,
        expected
    );
}
