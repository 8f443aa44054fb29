//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use reportal_capacity::ControllerState;
use reportal_entity::capacity::CapacityState;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status string.
    pub status: String,
    /// Crate version.
    pub version: String,
}

/// Session identity echoed after login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    /// Session owner.
    pub user_id: Uuid,
    /// Session login time.
    pub login_at: DateTime<Utc>,
}

/// Result of a heartbeat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingResponse {
    /// False when the ping was older than the stored one and was ignored.
    pub recorded: bool,
}

/// Capacity controller status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapacityStatusResponse {
    /// Controller state.
    pub state: ControllerState,
    /// Local presence count.
    pub presence: u64,
    /// Whether a suspend is pending.
    pub idle_timer_armed: bool,
    /// Last capacity state reported by the management API.
    pub last_observed: Option<CapacityState>,
    /// Whether settings exist with `auto_managed_capacity` on.
    pub auto_managed: bool,
    /// Whether the settings carry full addressing.
    pub configured: bool,
    /// Whether now falls inside the schedule.
    pub within_schedule: bool,
    /// Offset the schedule is evaluated at.
    pub utc_offset_minutes: i32,
}
