use std::sync::Arc;
use sigint_core::{Config, SanitizedConfig, SignalOrchestrator};

/// Shared application state
pub struct AppState {
    config: Config,
    orchestrator: Arc<SignalOrchestrator>,
}

impl AppState {
    pub fn new(config: Config, orchestrator: Arc<SignalOrchestrator>) -> Self {
        Self {
            config,
            orchestrator,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn orchestrator(&self) -> &SignalOrchestrator {
        self.orchestrator.as_ref()
    }
}
