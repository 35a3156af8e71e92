use crate::config::config::AppConfig;
use crate::observability::{AppMetrics, ObservabilityState};
use crate::services::character::CharacterService;
use crate::services::session::GameSessionService;
use crate::storage::StorageInstance;
use std::sync::Arc;

/// Application state containing all shared services
#[derive(Clone)]
pub struct AppState {
    /// Character creation and lookup
    pub character_service: Arc<dyn CharacterService>,
    /// Game session state machine
    pub session_service: Arc<dyn GameSessionService>,
    /// Storage backend, kept for health checks
    pub storage: Arc<StorageInstance>,
    /// In-process counters
    pub metrics: Arc<AppMetrics>,
    /// Loaded configuration
    pub config: Arc<AppConfig>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("character_service", &"Arc<dyn CharacterService>")
            .field("session_service", &"Arc<dyn GameSessionService>")
            .field("storage", &self.storage.backend_name())
            .field("metrics", &self.metrics)
            .field("environment", &self.config.environment)
            .finish()
    }
}

impl AppState {
    /// Create new application state
    pub fn new(
        character_service: Box<dyn CharacterService>,
        session_service: Box<dyn GameSessionService>,
        storage: Arc<StorageInstance>,
        metrics: Arc<AppMetrics>,
        config: AppConfig,
    ) -> Self {
        Self {
            character_service: Arc::from(character_service),
            session_service: Arc::from(session_service),
            storage,
            metrics,
            config: Arc::new(config),
        }
    }

    /// State for the health and metrics endpoints
    pub fn observability(&self) -> ObservabilityState {
        ObservabilityState::new(self.metrics.clone(), self.storage.clone())
    }
}
