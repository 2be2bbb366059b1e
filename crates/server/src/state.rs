use std::sync::Arc;

use topicwatch_core::{CheckScheduler, Config, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    scheduler: Arc<CheckScheduler>,
}

impl AppState {
    pub fn new(config: Config, scheduler: Arc<CheckScheduler>) -> Self {
        Self { config, scheduler }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn scheduler(&self) -> &CheckScheduler {
        self.scheduler.as_ref()
    }
}
