//! In-memory activity store guarded by a Tokio `RwLock`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use reportal_core::result::AppResult;
use reportal_entity::activity::{ActivitySession, PingOutcome};

use crate::store::{ActivityStore, active_cutoff, check_login, check_ping};

type SessionKey = (Uuid, DateTime<Utc>);

/// Process-local activity store.
///
/// Suitable for single-node deployments only; nothing survives a restart.
#[derive(Debug, Clone, Default)]
pub struct MemoryActivityStore {
    sessions: Arc<RwLock<HashMap<SessionKey, ActivitySession>>>,
}

impl MemoryActivityStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ActivityStore for MemoryActivityStore {
    async fn start_session(&self, user_id: Uuid, login_at: DateTime<Utc>) -> AppResult<()> {
        check_login(login_at)?;

        let mut sessions = self.sessions.write().await;
        sessions
            .entry((user_id, login_at))
            .or_insert_with(|| ActivitySession::started(user_id, login_at));
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

        let mut sessions = self.sessions.write().await;
        let session = sessions
            .entry((user_id, login_at))
            .or_insert_with(|| ActivitySession::started(user_id, login_at));

        if timestamp < session.last_ping {
            return Ok(PingOutcome::Stale);
        }

        session.last_ping = timestamp;
        session.session_duration = session_duration;
        Ok(PingOutcome::Recorded)
    }

    async fn count_active_since(&self, window: Duration) -> AppResult<u64> {
        let cutoff = active_cutoff(window)?;
        let sessions = self.sessions.read().await;
        Ok(sessions
            .values()
            .filter(|s| s.is_active_since(cutoff))
            .count() as u64)
    }

    async fn find_session(
        &self,
        user_id: Uuid,
        login_at: DateTime<Utc>,
    ) -> AppResult<Option<ActivitySession>> {
        Ok(self.sessions.read().await.get(&(user_id, login_at)).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use reportal_core::error::ErrorKind;

    const WINDOW: Duration = Duration::from_secs(300);

    #[tokio::test]
    async fn test_last_ping_is_max_regardless_of_arrival_order() {
        let store = MemoryActivityStore::new();
        let user = Uuid::new_v4();
        let login = Utc::now() - ChronoDuration::minutes(30);
        let t = |m: i64| login + ChronoDuration::minutes(m);

        // Later ping first, then two late arrivals, then a duplicate.
        for (ts, expected) in [
            (t(20), PingOutcome::Recorded),
            (t(5), PingOutcome::Stale),
            (t(19), PingOutcome::Stale),
            (t(20), PingOutcome::Recorded),
        ] {
            let outcome = store.record_ping(user, login, ts, 60).await.unwrap();
            assert_eq!(outcome, expected, "ping at {ts}");
        }

        let session = store.find_session(user, login).await.unwrap().unwrap();
        assert_eq!(session.last_ping, t(20));
    }

    #[tokio::test]
    async fn test_stale_ping_does_not_touch_duration() {
        let store = MemoryActivityStore::new();
        let user = Uuid::new_v4();
        let login = Utc::now() - ChronoDuration::minutes(10);

        store
            .record_ping(user, login, login + ChronoDuration::minutes(5), 300)
            .await
            .unwrap();
        store
            .record_ping(user, login, login + ChronoDuration::minutes(1), 60)
            .await
            .unwrap();

        let session = store.find_session(user, login).await.unwrap().unwrap();
        assert_eq!(session.session_duration, 300);
    }

    #[tokio::test]
    async fn test_ping_before_login_is_rejected() {
        let store = MemoryActivityStore::new();
        let login = Utc::now();
        let err = store
            .record_ping(Uuid::new_v4(), login, login - ChronoDuration::seconds(1), 0)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_duplicate_login_keeps_existing_row() {
        let store = MemoryActivityStore::new();
        let user = Uuid::new_v4();
        let login = Utc::now() - ChronoDuration::minutes(2);

        store.start_session(user, login).await.unwrap();
        store.record_ping(user, login, Utc::now(), 120).await.unwrap();
        store.start_session(user, login).await.unwrap();

        let session = store.find_session(user, login).await.unwrap().unwrap();
        assert_eq!(session.session_duration, 120);
        assert!(session.last_ping > login);
    }

    #[tokio::test]
    async fn test_count_active_since_filters_by_window() {
        let store = MemoryActivityStore::new();
        let now = Utc::now();

        let fresh = now - ChronoDuration::minutes(1);
        store.start_session(Uuid::new_v4(), fresh).await.unwrap();

        let old_login = now - ChronoDuration::hours(2);
        let old_user = Uuid::new_v4();
        store.start_session(old_user, old_login).await.unwrap();
        store
            .record_ping(old_user, old_login, now - ChronoDuration::minutes(10), 6600)
            .await
            .unwrap();

        assert_eq!(store.count_active_since(WINDOW).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_sessions_of_same_user_are_distinct() {
        let store = MemoryActivityStore::new();
        let user = Uuid::new_v4();
        let now = Utc::now();

        store.start_session(user, now - ChronoDuration::seconds(30)).await.unwrap();
        store.start_session(user, now - ChronoDuration::seconds(10)).await.unwrap();

        assert_eq!(store.count_active_since(WINDOW).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_future_ping_does_not_pin_session_active() {
        let store = MemoryActivityStore::new();
        let user = Uuid::new_v4();
        let login = Utc::now() - ChronoDuration::minutes(10);
        store.start_session(user, login).await.unwrap();

        let err = store
            .record_ping(user, login, Utc::now() + ChronoDuration::hours(1), 600)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        // The honest ping that follows still lands.
        let honest = Utc::now();
        let outcome = store.record_ping(user, login, honest, 600).await.unwrap();
        assert_eq!(outcome, PingOutcome::Recorded);

        let session = store.find_session(user, login).await.unwrap().unwrap();
        assert_eq!(session.last_ping, honest);
    }

    #[tokio::test]
    async fn test_future_login_is_rejected_and_not_counted() {
        let store = MemoryActivityStore::new();
        let err = store
            .start_session(Uuid::new_v4(), Utc::now() + ChronoDuration::hours(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(store.count_active_since(WINDOW).await.unwrap(), 0);
    }
}
