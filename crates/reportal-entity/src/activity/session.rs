//! Activity session entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One row per login session.
///
/// `(user_id, login_at)` identifies the session. Rows are never deleted;
/// stale sessions simply fall out of the active window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ActivitySession {
    /// The user this session belongs to.
    pub user_id: Uuid,
    /// Login time; part of the session key.
    pub login_at: DateTime<Utc>,
    /// Latest accepted heartbeat. Never moves backwards.
    pub last_ping: DateTime<Utc>,
    /// Client-reported session duration in seconds.
    pub session_duration: i64,
}

impl ActivitySession {
    /// A fresh session as created at login.
    pub fn started(user_id: Uuid, login_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            login_at,
            last_ping: login_at,
            session_duration: 0,
        }
    }

    /// Whether the session pinged at or after `cutoff`.
    pub fn is_active_since(&self, cutoff: DateTime<Utc>) -> bool {
        self.last_ping >= cutoff
    }
}

/// Result of submitting a heartbeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PingOutcome {
    /// The ping advanced (or repeated) the stored `last_ping`.
    Recorded,
    /// The ping was older than the stored value and was ignored.
    Stale,
}

impl PingOutcome {
    /// Whether the ping was applied.
    pub fn is_recorded(&self) -> bool {
        matches!(self, Self::Recorded)
    }
}
