// Shared server state
// Everything a request needs: configuration and the application registry

use std::sync::atomic::{AtomicBool, Ordering};

use crate::app::AppRegistry;

use super::types::Config;

/// Process-wide immutable state shared across connections
pub struct ServerState {
    pub config: Config,
    pub registry: AppRegistry,

    // Cached for lock-free access on the request path
    cached_access_log: AtomicBool,
}

impl ServerState {
    #[must_use]
    pub fn new(config: Config, registry: AppRegistry) -> Self {
        let cached_access_log = AtomicBool::new(config.logging.access_log);
        Self {
            config,
            registry,
            cached_access_log,
        }
    }

    #[must_use]
    pub fn access_log_enabled(&self) -> bool {
        self.cached_access_log.load(Ordering::Relaxed)
    }
}
