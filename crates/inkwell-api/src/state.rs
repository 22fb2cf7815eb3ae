//! Shared application state.

use std::sync::Arc;

use inkwell_core::repository::EventRepository;
use inkwell_enrichment::pipeline::EnrichmentPipeline;
use inkwell_narrative::application::orchestrator::TurnOrchestrator;

use crate::registry::EnrichmentRegistry;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Session event store.
    pub event_repository: Arc<dyn EventRepository>,
    /// Turn orchestrator.
    pub orchestrator: TurnOrchestrator,
    /// Enrichment of the latest turn per session.
    pub enrichment: Arc<EnrichmentRegistry>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("orchestrator", &self.orchestrator)
            .field("enrichment", &self.enrichment)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(event_repository: Arc<dyn EventRepository>, orchestrator: TurnOrchestrator) -> Self {
        Self {
            event_repository,
            orchestrator,
            enrichment: Arc::new(EnrichmentRegistry::new()),
        }
    }

    /// The enrichment pipeline behind the standalone generator routes.
    #[must_use]
    pub fn pipeline(&self) -> &EnrichmentPipeline {
        self.orchestrator.pipeline()
    }
}
