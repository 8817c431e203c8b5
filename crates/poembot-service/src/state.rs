//! Application state.

use poembot_store::PoemsTable;

use crate::config::ServiceConfig;

/// Application state shared across handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The poems table, opened once per process.
    pub poems: PoemsTable,

    /// Service configuration.
    pub config: ServiceConfig,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(poems: PoemsTable, config: ServiceConfig) -> Self {
        tracing::debug!(table = %poems.table_id(), read_range = ?config.read_range, "App state created");
        Self { poems, config }
    }
}
