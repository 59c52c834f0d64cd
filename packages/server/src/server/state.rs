//! Shared application state.

use std::sync::Arc;

use idobata_shared::time::Clock;

use crate::{broadcast::Broadcaster, registry::Registry, storage::MessageLog};

/// State shared across all handlers.
pub struct AppState {
    /// All currently admitted connections.
    pub registry: Arc<Registry>,
    /// Fan-out engine over the registry.
    pub broadcaster: Broadcaster,
    /// Persistent message log.
    pub log: Arc<dyn MessageLog>,
    /// Clock used to stamp log entries.
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(registry: Arc<Registry>, log: Arc<dyn MessageLog>, clock: Arc<dyn Clock>) -> Self {
        let broadcaster = Broadcaster::new(registry.clone(), clock.clone());
        Self {
            registry,
            broadcaster,
            log,
            clock,
        }
    }
}
