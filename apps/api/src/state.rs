use std::sync::Arc;

use crate::analysis::batch::BatchAnalyzer;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Owns the skill vocabulary and the worker pool. Shared by every request.
    pub analyzer: Arc<BatchAnalyzer>,
}
