//! Built-in job implementations.

pub mod reconciliation;
