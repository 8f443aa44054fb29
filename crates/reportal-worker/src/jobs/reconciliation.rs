//! Reconciliation job: re-derives presence from the heartbeat store.
//!
//! Corrects drift from restarts, missed disconnects and other instances by
//! handing the shared active-session count to the capacity controller.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use reportal_capacity::CapacityHandle;
use reportal_database::ActivityStore;

use crate::executor::{JobExecutionError, JobHandler, run_logged};

/// Periodic heartbeat-to-controller reconciliation.
#[derive(Debug, Clone)]
pub struct ReconciliationJob {
    activity_store: Arc<dyn ActivityStore>,
    capacity: CapacityHandle,
    active_window: Duration,
}

impl ReconciliationJob {
    /// Create a new reconciliation job
    pub fn new(
        activity_store: Arc<dyn ActivityStore>,
        capacity: CapacityHandle,
        active_window: Duration,
    ) -> Self {
        Self {
            activity_store,
            capacity,
            active_window,
        }
    }

    /// Count active sessions and feed the controller.
    pub async fn reconcile(&self) -> Result<Value, JobExecutionError> {
        tracing::debug!("Running capacity reconciliation");

        let active_sessions = self
            .activity_store
            .count_active_since(self.active_window)
            .await
            .map_err(|e| {
                JobExecutionError::Transient(format!("Failed to count active sessions: {}", e))
            })?;

        self.capacity
            .reconcile(active_sessions)
            .await
            .map_err(|e| JobExecutionError::Permanent(e.message))?;

        Ok(serde_json::json!({
            "task": "capacity_reconciliation",
            "active_sessions": active_sessions,
            "active_window_seconds": self.active_window.as_secs(),
        }))
    }

    /// Run once at boot so a restarted process converges without waiting
    /// for the first cron tick.
    pub async fn startup_recovery(&self) {
        tracing::info!("Running startup capacity reconciliation");

        match run_logged(self).await {
            Some(summary) => tracing::info!(%summary, "Startup reconciliation complete"),
            None => tracing::warn!("Startup reconciliation failed; relying on the next tick"),
        }
    }
}

#[async_trait]
impl JobHandler for ReconciliationJob {
    fn job_type(&self) -> &str {
        "capacity_reconciliation"
    }

    async fn execute(&self) -> Result<Value, JobExecutionError> {
        self.reconcile().await
    }
}
