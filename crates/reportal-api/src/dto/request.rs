//! Request DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of `POST /api/activity/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// The user who logged in.
    pub user_id: Uuid,
    /// Login time; identifies the session.
    pub login_at: DateTime<Utc>,
}

/// Body of `POST /api/activity/ping`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingRequest {
    /// Session owner.
    pub user_id: Uuid,
    /// Session login time.
    pub login_at: DateTime<Utc>,
    /// Client-reported session duration in seconds.
    pub current_duration: i64,
    /// When the client sent the ping. Defaults to server time.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Text frame sent by a realtime client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// The page became visible.
    Active,
    /// The page went to the background.
    Away,
}
