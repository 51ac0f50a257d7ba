use std::sync::Arc;

use crate::analysis::synthesizer::Synthesizer;
use crate::store::AnalysisStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Analysis records and per-user analytics. Default: PgAnalysisStore.
    pub store: Arc<dyn AnalysisStore>,
    /// Fallback chain over the configured AI providers.
    pub synthesizer: Arc<Synthesizer>,
}
