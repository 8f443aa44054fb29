//! Activity session repository implementation.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use reportal_core::error::{AppError, ErrorKind};
use reportal_core::result::AppResult;
use reportal_entity::activity::{ActivitySession, PingOutcome};

use crate::store::{ActivityStore, active_cutoff, check_login, check_ping};

/// Repository for heartbeat-backed activity sessions.
#[derive(Debug, Clone)]
pub struct ActivityRepository {
    pool: PgPool,
}

impl ActivityRepository {
    /// Create a new activity repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityStore for ActivityRepository {
    async fn start_session(&self, user_id: Uuid, login_at: DateTime<Utc>) -> AppResult<()> {
        check_login(login_at)?;

        sqlx::query(
            "INSERT INTO activity_sessions (user_id, login_at, last_ping, session_duration) \
             VALUES ($1, $2, $2, 0) ON CONFLICT (user_id, login_at) DO NOTHING",
        )
        .bind(user_id)
        .bind(login_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to start activity session", e)
        })?;
        Ok(())
    }

    async fn record_ping(
        &self,
        user_id: Uuid,
        login_at: DateTime<Utc>,
        timestamp: DateTime<Utc>,
        session_duration: i64,
    ) -> AppResult<PingOutcome> {
        check_ping(login_at, timestamp, session_duration)?;

        // The conditional update is what keeps last_ping monotonic under
        // out-of-order delivery: an older ping matches the conflict but not
        // the WHERE clause, so zero rows are affected.
        let result = sqlx::query(
            "INSERT INTO activity_sessions (user_id, login_at, last_ping, session_duration) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (user_id, login_at) DO UPDATE \
             SET last_ping = EXCLUDED.last_ping, session_duration = EXCLUDED.session_duration \
             WHERE activity_sessions.last_ping <= EXCLUDED.last_ping",
        )
        .bind(user_id)
        .bind(login_at)
        .bind(timestamp)
        .bind(session_duration)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to record ping", e))?;

        if result.rows_affected() == 0 {
            Ok(PingOutcome::Stale)
        } else {
            Ok(PingOutcome::Recorded)
        }
    }

    async fn count_active_since(&self, window: Duration) -> AppResult<u64> {
        let cutoff = active_cutoff(window)?;
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM activity_sessions WHERE last_ping >= $1")
                .bind(cutoff)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(
                        ErrorKind::Database,
                        "Failed to count active sessions",
                        e,
                    )
                })?;
        Ok(count.max(0) as u64)
    }

    async fn find_session(
        &self,
        user_id: Uuid,
        login_at: DateTime<Utc>,
    ) -> AppResult<Option<ActivitySession>> {
        sqlx::query_as::<_, ActivitySession>(
            "SELECT user_id, login_at, last_ping, session_duration FROM activity_sessions \
             WHERE user_id = $1 AND login_at = $2",
        )
        .bind(user_id)
        .bind(login_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find activity session", e)
        })
    }
}
