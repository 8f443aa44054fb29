//! Heartbeat-backed activity sessions.

pub mod session;

pub use session::{ActivitySession, PingOutcome};
