//! Heartbeat handlers.

use axum::Json;
use axum::extract::State;
use chrono::Utc;

use crate::dto::request::{LoginRequest, PingRequest};
use crate::dto::response::{ApiResponse, PingResponse, SessionResponse};
use crate::error::ApiResult;
use crate::state::AppState;

/// POST /api/activity/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<ApiResponse<SessionResponse>>> {
    state
        .activity_store
        .start_session(req.user_id, req.login_at)
        .await?;

    tracing::debug!(user_id = %req.user_id, login_at = %req.login_at, "Session started");

    Ok(Json(ApiResponse::ok(SessionResponse {
        user_id: req.user_id,
        login_at: req.login_at,
    })))
}

/// POST /api/activity/ping
pub async fn ping(
    State(state): State<AppState>,
    Json(req): Json<PingRequest>,
) -> ApiResult<Json<ApiResponse<PingResponse>>> {
    let timestamp = req.timestamp.unwrap_or_else(Utc::now);

    let outcome = state
        .activity_store
        .record_ping(req.user_id, req.login_at, timestamp, req.current_duration)
        .await?;

    if !outcome.is_recorded() {
        tracing::debug!(user_id = %req.user_id, %timestamp, "Stale heartbeat ignored");
    }

    Ok(Json(ApiResponse::ok(PingResponse {
        recorded: outcome.is_recorded(),
    })))
}
