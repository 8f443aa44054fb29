//! Cron scheduler for periodic background tasks.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};

use reportal_core::error::AppError;

use crate::executor::{JobHandler, run_logged};

/// Cron-based scheduler for periodic background tasks
pub struct CronScheduler {
    /// The underlying job scheduler
    scheduler: JobScheduler,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler").finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler
    pub async fn new() -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self { scheduler })
    }

    /// Run `handler` on every tick of the six-field `cron` expression.
    pub async fn register(&self, handler: Arc<dyn JobHandler>, cron: &str) -> Result<(), AppError> {
        let name = handler.job_type().to_string();

        let job = CronJob::new_async(cron, move |_uuid, _lock| {
            let handler = Arc::clone(&handler);
            Box::pin(async move {
                tracing::trace!(job = handler.job_type(), "Cron tick");
                run_logged(handler.as_ref()).await;
            })
        })
        .map_err(|e| {
            AppError::configuration(format!("Invalid schedule '{}' for {}: {}", cron, name, e))
        })?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add {} schedule: {}", name, e)))?;

        tracing::info!("Registered: {} ({})", name, cron);
        Ok(())
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {}", e)))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&self) -> Result<(), AppError> {
        let mut scheduler = self.scheduler.clone();
        scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {}", e)))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }
}
