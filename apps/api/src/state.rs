use std::sync::Arc;

use crate::config::Config;
use crate::intake::extract::TextExtractor;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Pluggable text extractor. Default: `LibraryExtractor`.
    pub extractor: Arc<dyn TextExtractor>,
}
