//! Store contracts consumed by the capacity controller.
//!
//! The controller never talks to sqlx directly; it sees only these traits,
//! so the Postgres repositories and the in-memory stores are interchangeable.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use reportal_core::{AppError, AppResult};
use reportal_entity::activity::{ActivitySession, PingOutcome};
use reportal_entity::capacity::CapacitySettings;
use reportal_entity::schedule::ScheduleWindow;

/// Durable, cross-process evidence of session activity.
#[async_trait]
pub trait ActivityStore: Send + Sync + std::fmt::Debug + 'static {
    /// Create the session row at login. A duplicate login event is a no-op.
    ///
    /// A `login_at` further ahead of server time than [`MAX_CLOCK_SKEW`] is
    /// a validation error.
    async fn start_session(&self, user_id: Uuid, login_at: DateTime<Utc>) -> AppResult<()>;

    /// Upsert `last_ping` and `session_duration` for a session.
    ///
    /// Returns [`PingOutcome::Stale`] without writing when `timestamp` is
    /// older than the stored `last_ping`. A `timestamp` before `login_at`,
    /// or further ahead of server time than [`MAX_CLOCK_SKEW`], is a
    /// validation error.
    async fn record_ping(
        &self,
        user_id: Uuid,
        login_at: DateTime<Utc>,
        timestamp: DateTime<Utc>,
        session_duration: i64,
    ) -> AppResult<PingOutcome>;

    /// Number of sessions whose `last_ping` falls within `window` of now.
    async fn count_active_since(&self, window: Duration) -> AppResult<u64>;

    /// Look up one session.
    async fn find_session(
        &self,
        user_id: Uuid,
        login_at: DateTime<Utc>,
    ) -> AppResult<Option<ActivitySession>>;
}

/// Administrator-owned capacity configuration.
#[async_trait]
pub trait CapacityConfigStore: Send + Sync + std::fmt::Debug + 'static {
    /// The singleton settings row, if one has been saved.
    async fn get_settings(&self) -> AppResult<Option<CapacitySettings>>;

    /// All schedule windows, ordered by day and start time.
    async fn get_schedule(&self) -> AppResult<Vec<ScheduleWindow>>;

    /// Insert or overwrite the singleton settings row.
    async fn upsert_settings(&self, settings: &CapacitySettings) -> AppResult<CapacitySettings>;

    /// Replace the whole schedule (delete-all-then-insert, atomically).
    async fn replace_schedule(&self, windows: &[ScheduleWindow]) -> AppResult<()>;
}

/// How far a client clock may run ahead of the server. Logins and pings
/// dated later than `now + MAX_CLOCK_SKEW` are rejected and never stored.
pub const MAX_CLOCK_SKEW: Duration = Duration::from_secs(60);

/// Reject instants further in the future than [`MAX_CLOCK_SKEW`].
fn check_not_future(what: &str, at: DateTime<Utc>) -> AppResult<()> {
    let latest = Utc::now() + chrono::Duration::seconds(MAX_CLOCK_SKEW.as_secs() as i64);
    if at > latest {
        return Err(AppError::validation(format!(
            "{what} at {at} is ahead of server time"
        )));
    }
    Ok(())
}

/// Validation for a login event.
pub(crate) fn check_login(login_at: DateTime<Utc>) -> AppResult<()> {
    check_not_future("login", login_at)
}

/// Validation shared by every [`ActivityStore`] implementation.
pub(crate) fn check_ping(
    login_at: DateTime<Utc>,
    timestamp: DateTime<Utc>,
    session_duration: i64,
) -> AppResult<()> {
    check_not_future("ping", timestamp)?;
    if timestamp < login_at {
        return Err(AppError::validation(format!(
            "ping at {timestamp} precedes login at {login_at}"
        )));
    }
    if session_duration < 0 {
        return Err(AppError::validation("session_duration must not be negative"));
    }
    Ok(())
}

/// Start of the active window ending now.
pub(crate) fn active_cutoff(window: Duration) -> AppResult<DateTime<Utc>> {
    let window = chrono::Duration::from_std(window)
        .map_err(|e| AppError::validation(format!("active window out of range: {e}")))?;
    Ok(Utc::now() - window)
}

/// Validate every row before any write so a bad row never half-applies.
pub(crate) fn check_schedule(windows: &[ScheduleWindow]) -> AppResult<()> {
    windows.iter().try_for_each(ScheduleWindow::validate)
}

/// Canonical schedule ordering.
pub(crate) fn sort_schedule(windows: &mut [ScheduleWindow]) {
    windows.sort_by_key(|w| (w.day_of_week, w.start_minute_of_day(), w.end_minute_of_day()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use reportal_core::error::ErrorKind;

    #[test]
    fn test_ping_within_skew_is_accepted() {
        let login = Utc::now() - chrono::Duration::minutes(5);
        let slightly_ahead = Utc::now() + chrono::Duration::seconds(30);
        assert!(check_ping(login, slightly_ahead, 300).is_ok());
    }

    #[test]
    fn test_future_ping_and_login_are_rejected() {
        let ahead = Utc::now() + chrono::Duration::hours(1);

        let err = check_ping(Utc::now(), ahead, 0).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let err = check_login(ahead).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn test_negative_duration_is_rejected() {
        let login = Utc::now() - chrono::Duration::minutes(1);
        assert!(check_ping(login, Utc::now(), -1).is_err());
    }
}
