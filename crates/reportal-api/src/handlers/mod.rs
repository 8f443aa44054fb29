//! Route handlers.

pub mod activity;
pub mod capacity;
pub mod health;
pub mod ws;
