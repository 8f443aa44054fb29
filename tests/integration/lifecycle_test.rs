//! End-to-end capacity lifecycle: heartbeats in, resume/suspend out.

use std::time::Duration;

use chrono::{Datelike, Utc};
use http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use reportal_capacity::{ControllerState, PresenceSignal};
use reportal_database::CapacityConfigStore;
use reportal_entity::capacity::CapacityState;
use reportal_entity::schedule::ScheduleWindow;

use crate::helpers::{TestApp, managed_settings};

const IDLE: Duration = Duration::from_secs(300);

async fn login(app: &TestApp) {
    let response = app
        .request(
            "POST",
            "/api/activity/login",
            Some(json!({ "user_id": Uuid::new_v4(), "login_at": Utc::now() })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test(start_paused = true)]
async fn test_heartbeat_resumes_suspended_capacity() {
    let app = TestApp::new(CapacityState::Suspended, Some(managed_settings()));
    login(&app).await;

    let summary = app.job.reconcile().await.unwrap();
    assert_eq!(summary["active_sessions"], 1);

    let snapshot = app.capacity.snapshot().await.unwrap();
    assert_eq!(snapshot.state, ControllerState::WatchingActive);
    assert_eq!(app.adapter.resumes(), 1);

    app.job.reconcile().await.unwrap();
    assert_eq!(app.adapter.resumes(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_empty_store_suspends_after_idle_window() {
    let app = TestApp::new(CapacityState::Active, Some(managed_settings()));

    app.job.startup_recovery().await;
    assert!(app.capacity.snapshot().await.unwrap().idle_timer_armed);

    tokio::time::sleep(IDLE + Duration::from_secs(1)).await;

    let response = app.request("GET", "/api/capacity/status", None).await;
    assert_eq!(response.body["data"]["state"], "suspended_confirmed");
    assert_eq!(response.body["data"]["last_observed"], "suspended");
    assert_eq!(app.adapter.suspends(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_live_heartbeats_outlast_local_disconnect() {
    let app = TestApp::new(CapacityState::Active, Some(managed_settings()));
    login(&app).await;

    app.capacity.presence(PresenceSignal::Connect).await.unwrap();
    app.capacity.presence(PresenceSignal::Disconnect).await.unwrap();

    for _ in 0..3 {
        app.job.reconcile().await.unwrap();
        tokio::time::sleep(IDLE).await;
    }

    let snapshot = app.capacity.snapshot().await.unwrap();
    assert_eq!(snapshot.state, ControllerState::WatchingActive);
    assert!(!snapshot.idle_timer_armed);
    assert_eq!(app.adapter.suspends(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_out_of_schedule_never_calls_adapter() {
    let app = TestApp::new(CapacityState::Suspended, Some(managed_settings()));
    let other_day = ((Utc::now().weekday().num_days_from_sunday() + 3) % 7) as i16;
    app.config_store
        .replace_schedule(&[ScheduleWindow::new(other_day, (0, 0), (24, 0))])
        .await
        .unwrap();

    login(&app).await;
    app.capacity.presence(PresenceSignal::Connect).await.unwrap();
    app.job.reconcile().await.unwrap();

    let response = app.request("GET", "/api/capacity/status", None).await;
    assert_eq!(response.body["data"]["within_schedule"], false);
    assert_eq!(
        (app.adapter.gets(), app.adapter.resumes(), app.adapter.suspends()),
        (0, 0, 0)
    );
}

#[tokio::test(start_paused = true)]
async fn test_missing_capacity_name_disables_autoscaling() {
    let mut settings = managed_settings();
    settings.capacity_name = None;
    let app = TestApp::new(CapacityState::Suspended, Some(settings));

    login(&app).await;
    app.job.reconcile().await.unwrap();
    app.capacity.presence(PresenceSignal::Connect).await.unwrap();
    app.capacity.presence(PresenceSignal::Disconnect).await.unwrap();
    tokio::time::sleep(IDLE * 2).await;

    assert_eq!(app.adapter.resumes(), 0);
    assert_eq!(app.adapter.suspends(), 0);
    let response = app.request("GET", "/api/capacity/status", None).await;
    assert_eq!(response.body["data"]["configured"], false);
}
