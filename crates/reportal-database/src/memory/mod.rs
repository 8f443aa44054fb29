//! In-memory store implementations for single-node deployments and tests.

pub mod activity;
pub mod capacity;

pub use activity::MemoryActivityStore;
pub use capacity::MemoryCapacityConfigStore;
