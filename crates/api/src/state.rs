use std::sync::Arc;

use planserve_core::events::EventBus;
use planserve_core::history::HistoryLog;
use planserve_core::launcher::ConverterContext;
use planserve_core::registry::JobRegistry;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (all inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Live job records.
    pub registry: Arc<JobRegistry>,
    /// Completed-conversion history.
    pub history: Arc<HistoryLog>,
    /// Event bus for terminal conversion outcomes.
    pub event_bus: Arc<EventBus>,
    /// Launcher configuration derived from the server config.
    pub converter: Arc<ConverterContext>,
}

impl AppState {
    /// Build fresh state from configuration.
    pub fn new(config: ServerConfig) -> Self {
        let converter = Arc::new(config.converter_context());
        let history = Arc::new(HistoryLog::new(config.history_capacity));
        Self {
            config: Arc::new(config),
            registry: Arc::new(JobRegistry::new()),
            history,
            event_bus: Arc::new(EventBus::default()),
            converter,
        }
    }
}
