// ABOUTME: Shared application state for the trailquery HTTP server.
// ABOUTME: Holds the query executor, the model connector, and the narrative policy; read-only per request.

use std::sync::Arc;

use trailquery_agent::{
    GeminiConnector, ModelConnector, NarrativePolicy, QueryOrchestrator, ToolRegistry,
};
use trailquery_core::{FilterEngine, JqEngine, QueryExecutor, RecordStore};

use crate::config::ServerConfig;

/// Shared application state accessible by all Axum handlers.
/// Nothing in here is mutated after startup.
pub struct AppState {
    pub executor: QueryExecutor,
    pub connector: Arc<dyn ModelConnector>,
    pub policy: NarrativePolicy,
}

/// Type alias for the Arc-wrapped state used with Axum's State extractor.
pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(
        store: RecordStore,
        engine: Arc<dyn FilterEngine>,
        connector: Arc<dyn ModelConnector>,
    ) -> Self {
        Self {
            executor: QueryExecutor::new(store, engine),
            connector,
            policy: NarrativePolicy::default(),
        }
    }

    /// Production state: jq subprocess engine and Gemini connector.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            RecordStore::new(config.data_dir.clone()),
            Arc::new(JqEngine::new(config.jq_bin.clone())),
            Arc::new(GeminiConnector::new(
                config.gemini_base_url.clone(),
                config.gemini_model.clone(),
            )),
        )
    }

    pub fn store(&self) -> &RecordStore {
        self.executor.store()
    }

    /// Build an orchestrator for one request around an already-connected model.
    pub fn orchestrator(&self, model: Arc<dyn trailquery_agent::LanguageModel>) -> QueryOrchestrator {
        QueryOrchestrator::new(
            model,
            ToolRegistry::new(self.executor.clone()),
            self.policy.clone(),
        )
    }
}
