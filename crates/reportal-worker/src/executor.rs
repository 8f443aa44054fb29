//! Job handler contract.

use async_trait::async_trait;
use serde_json::Value;

use reportal_core::error::AppError;

/// A unit of scheduled work.
#[async_trait]
pub trait JobHandler: Send + Sync + std::fmt::Debug + 'static {
    /// Stable name used in logs.
    fn job_type(&self) -> &str;

    /// Run once and return a summary of what was done.
    async fn execute(&self) -> Result<Value, JobExecutionError>;
}

/// Error from job execution
#[derive(Debug, thiserror::Error)]
pub enum JobExecutionError {
    /// Permanent failure; do not retry
    #[error("Permanent job failure: {0}")]
    Permanent(String),

    /// Transient failure; the next scheduled run may succeed
    #[error("Transient job failure: {0}")]
    Transient(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] AppError),
}

/// Execute `handler` and log the outcome. Failures never propagate.
pub async fn run_logged(handler: &dyn JobHandler) -> Option<Value> {
    match handler.execute().await {
        Ok(summary) => {
            tracing::debug!(job = handler.job_type(), %summary, "Job completed");
            Some(summary)
        }
        Err(JobExecutionError::Transient(msg)) => {
            tracing::warn!(job = handler.job_type(), "Job failed, will run again: {}", msg);
            None
        }
        Err(e) => {
            tracing::error!(job = handler.job_type(), error = %e, "Job failed");
            None
        }
    }
}
