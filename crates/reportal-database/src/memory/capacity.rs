//! In-memory capacity configuration store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use reportal_core::result::AppResult;
use reportal_entity::capacity::CapacitySettings;
use reportal_entity::schedule::ScheduleWindow;

use crate::store::{CapacityConfigStore, check_schedule, sort_schedule};

#[derive(Debug, Default)]
struct InnerState {
    settings: Option<CapacitySettings>,
    schedule: Vec<ScheduleWindow>,
}

/// Process-local settings and schedule.
///
/// Both live under one lock so a schedule replacement is never observed
/// half-applied.
#[derive(Debug, Clone, Default)]
pub struct MemoryCapacityConfigStore {
    state: Arc<RwLock<InnerState>>,
}

impl MemoryCapacityConfigStore {
    /// Creates an empty store: no settings, no schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `settings`.
    pub fn with_settings(settings: CapacitySettings) -> Self {
        Self {
            state: Arc::new(RwLock::new(InnerState {
                settings: Some(settings),
                schedule: Vec::new(),
            })),
        }
    }
}

#[async_trait]
impl CapacityConfigStore for MemoryCapacityConfigStore {
    async fn get_settings(&self) -> AppResult<Option<CapacitySettings>> {
        Ok(self.state.read().await.settings.clone())
    }

    async fn get_schedule(&self) -> AppResult<Vec<ScheduleWindow>> {
        Ok(self.state.read().await.schedule.clone())
    }

    async fn upsert_settings(&self, settings: &CapacitySettings) -> AppResult<CapacitySettings> {
        let mut saved = settings.clone();
        saved.updated_at = Utc::now();
        self.state.write().await.settings = Some(saved.clone());
        Ok(saved)
    }

    async fn replace_schedule(&self, windows: &[ScheduleWindow]) -> AppResult<()> {
        check_schedule(windows)?;

        let mut rows = windows.to_vec();
        sort_schedule(&mut rows);
        self.state.write().await.schedule = rows;
        Ok(())
    }
}
