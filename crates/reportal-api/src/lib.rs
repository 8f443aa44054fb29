//! # reportal-api
//!
//! Thin inbound surface: heartbeat endpoints, the realtime presence socket
//! and a read-only view of the capacity controller. Authentication lives in
//! front of this service.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
