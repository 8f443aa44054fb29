//! Capacity status handler.

use axum::Json;
use axum::extract::State;
use chrono::Utc;

use reportal_capacity::ScheduleEvaluator;

use crate::dto::response::{ApiResponse, CapacityStatusResponse};
use crate::error::ApiResult;
use crate::state::AppState;

/// GET /api/capacity/status
pub async fn status(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<CapacityStatusResponse>>> {
    let evaluator = ScheduleEvaluator::from_config(&state.config.capacity)?;
    let snapshot = state.capacity.snapshot().await?;
    let settings = state.config_store.get_settings().await?;
    let schedule = state.config_store.get_schedule().await?;

    Ok(Json(ApiResponse::ok(CapacityStatusResponse {
        state: snapshot.state,
        presence: snapshot.presence,
        idle_timer_armed: snapshot.idle_timer_armed,
        last_observed: snapshot.last_observed,
        auto_managed: settings.as_ref().is_some_and(|s| s.auto_managed_capacity),
        configured: settings.as_ref().is_some_and(|s| s.address().is_ok()),
        within_schedule: evaluator.is_within_schedule(&schedule, Utc::now()),
        utc_offset_minutes: state.config.capacity.utc_offset_minutes,
    })))
}
