//! HTTP surface tests.

use chrono::{Duration, Utc};
use http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use reportal_database::ActivityStore;
use reportal_entity::capacity::CapacityState;

use crate::helpers::{TestApp, managed_settings};

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new(CapacityState::Active, None);

    let response = app.request("GET", "/api/health", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "ok");
}

#[tokio::test]
async fn test_login_then_pings_update_session() {
    let app = TestApp::new(CapacityState::Active, None);
    let user_id = Uuid::new_v4();
    let login_at = Utc::now() - Duration::minutes(10);

    let response = app
        .request(
            "POST",
            "/api/activity/login",
            Some(json!({ "user_id": user_id, "login_at": login_at })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let newer = login_at + Duration::minutes(8);
    let response = app
        .request(
            "POST",
            "/api/activity/ping",
            Some(json!({
                "user_id": user_id,
                "login_at": login_at,
                "current_duration": 480,
                "timestamp": newer,
            })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["recorded"], true);

    // Delivered late: acknowledged but not applied.
    let response = app
        .request(
            "POST",
            "/api/activity/ping",
            Some(json!({
                "user_id": user_id,
                "login_at": login_at,
                "current_duration": 120,
                "timestamp": login_at + Duration::minutes(2),
            })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["recorded"], false);

    let session = app
        .activity
        .find_session(user_id, login_at)
        .await
        .unwrap()
        .expect("session exists");
    assert_eq!(session.last_ping, newer);
    assert_eq!(session.session_duration, 480);
}

#[tokio::test]
async fn test_ping_without_timestamp_uses_server_time() {
    let app = TestApp::new(CapacityState::Active, None);
    let user_id = Uuid::new_v4();
    let login_at = Utc::now() - Duration::minutes(1);

    let response = app
        .request(
            "POST",
            "/api/activity/ping",
            Some(json!({ "user_id": user_id, "login_at": login_at, "current_duration": 60 })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let session = app.activity.find_session(user_id, login_at).await.unwrap().unwrap();
    assert!(session.last_ping > login_at);
}

#[tokio::test]
async fn test_ping_before_login_is_bad_request() {
    let app = TestApp::new(CapacityState::Active, None);
    let login_at = Utc::now();

    let response = app
        .request(
            "POST",
            "/api/activity/ping",
            Some(json!({
                "user_id": Uuid::new_v4(),
                "login_at": login_at,
                "current_duration": 0,
                "timestamp": login_at - Duration::seconds(30),
            })),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_future_dated_ping_is_rejected() {
    let app = TestApp::new(CapacityState::Active, None);
    let user_id = Uuid::new_v4();
    let login_at = Utc::now() - Duration::minutes(5);

    let response = app
        .request(
            "POST",
            "/api/activity/ping",
            Some(json!({
                "user_id": user_id,
                "login_at": login_at,
                "current_duration": 300,
                "timestamp": Utc::now() + Duration::hours(1),
            })),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    // A skewed client must not lock out its own later heartbeats.
    let response = app
        .request(
            "POST",
            "/api/activity/ping",
            Some(json!({ "user_id": user_id, "login_at": login_at, "current_duration": 310 })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["recorded"], true);
}

#[tokio::test]
async fn test_malformed_ping_is_rejected() {
    let app = TestApp::new(CapacityState::Active, None);

    let response = app
        .request("POST", "/api/activity/ping", Some(json!({ "user_id": "nope" })))
        .await;

    assert!(response.status.is_client_error(), "got {}", response.status);
}

#[tokio::test]
async fn test_capacity_status_reports_gate_inputs() {
    let app = TestApp::new(CapacityState::Active, Some(managed_settings()));

    let response = app.request("GET", "/api/capacity/status", None).await;

    assert_eq!(response.status, StatusCode::OK);
    let data = &response.body["data"];
    assert_eq!(data["state"], "unknown");
    assert_eq!(data["presence"], 0);
    assert_eq!(data["idle_timer_armed"], false);
    assert_eq!(data["auto_managed"], true);
    assert_eq!(data["configured"], true);
    assert_eq!(data["within_schedule"], true);
}

#[tokio::test]
async fn test_capacity_status_without_settings() {
    let app = TestApp::new(CapacityState::Active, None);

    let response = app.request("GET", "/api/capacity/status", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["auto_managed"], false);
    assert_eq!(response.body["data"]["configured"], false);
}

#[tokio::test]
async fn test_capacity_status_uses_configured_offset() {
    use chrono::{Datelike, Timelike};
    use reportal_database::CapacityConfigStore;
    use reportal_entity::schedule::ScheduleWindow;

    // Twelve hours east: the local hour never equals the UTC hour.
    let app = TestApp::with_utc_offset(CapacityState::Active, Some(managed_settings()), 720);
    let local = Utc::now() + Duration::minutes(720);
    let hour = local.hour() as i16;
    app.config_store
        .replace_schedule(&[ScheduleWindow::new(
            local.weekday().num_days_from_sunday() as i16,
            (hour, 0),
            (hour + 1, 0),
        )])
        .await
        .unwrap();

    let response = app.request("GET", "/api/capacity/status", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["within_schedule"], true);
    assert_eq!(response.body["data"]["utc_offset_minutes"], 720);
}

#[tokio::test]
async fn test_ws_requires_upgrade() {
    let app = TestApp::new(CapacityState::Active, None);

    let response = app.request("GET", "/ws", None).await;

    assert!(response.status.is_client_error(), "got {}", response.status);
    let snapshot = app.capacity.snapshot().await.unwrap();
    assert_eq!(snapshot.presence, 0);
}
