//! Scheduled background work for Reportal.
//!
//! This crate provides:
//! - A cron scheduler that triggers registered job handlers
//! - The job handler contract and its error type
//! - The reconciliation job that feeds heartbeat counts to the capacity
//!   controller

pub mod executor;
pub mod jobs;
pub mod scheduler;

pub use executor::{JobExecutionError, JobHandler};
pub use jobs::reconciliation::ReconciliationJob;
pub use scheduler::CronScheduler;
