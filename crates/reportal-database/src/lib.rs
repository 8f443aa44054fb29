//! # reportal-database
//!
//! PostgreSQL connection management, the narrow store contracts the
//! capacity controller depends on, and two implementations of each:
//! sqlx-backed repositories and in-memory stores for single-node runs.

pub mod connection;
pub mod memory;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use store::{ActivityStore, CapacityConfigStore};
