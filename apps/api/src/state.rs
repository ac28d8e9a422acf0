use std::sync::Arc;

use crate::analysis::pipeline::Pipeline;
use crate::sessions::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Pipeline,
    /// Uploads and analysis runs. Swappable for an external store.
    pub sessions: Arc<dyn SessionStore>,
}
