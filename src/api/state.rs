//! Application state for the API server

use crate::{BatchManager, Config};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request (cheap Arc clone).
#[derive(Clone)]
pub struct AppState {
    /// The batch manager instance
    pub manager: Arc<BatchManager>,

    /// Configuration (read-only)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(manager: Arc<BatchManager>, config: Arc<Config>) -> Self {
        Self { manager, config }
    }
}
