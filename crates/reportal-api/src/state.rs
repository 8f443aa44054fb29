//! Application state shared across all handlers.

use std::sync::Arc;

use reportal_capacity::CapacityHandle;
use reportal_core::config::AppConfig;
use reportal_database::{ActivityStore, CapacityConfigStore};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration; the status view reads the schedule offset here
    pub config: Arc<AppConfig>,
    /// Heartbeat store
    pub activity_store: Arc<dyn ActivityStore>,
    /// Capacity settings and schedule
    pub config_store: Arc<dyn CapacityConfigStore>,
    /// Capacity controller
    pub capacity: CapacityHandle,
}
