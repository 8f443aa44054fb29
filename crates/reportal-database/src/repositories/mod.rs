//! PostgreSQL repository implementations of the store contracts.

pub mod activity;
pub mod capacity;

pub use activity::ActivityRepository;
pub use capacity::CapacityConfigRepository;
