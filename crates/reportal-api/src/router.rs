//! Route definitions for the Reportal HTTP API.

use axum::Router;
use axum::http::Method;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(activity_routes())
        .merge(capacity_routes())
        .merge(health_routes());

    let ws_routes = Router::new().route("/ws", get(handlers::ws::ws_upgrade));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .nest("/api", api_routes)
        .merge(ws_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Heartbeat endpoints
fn activity_routes() -> Router<AppState> {
    Router::new()
        .route("/activity/login", post(handlers::activity::login))
        .route("/activity/ping", post(handlers::activity::ping))
}

/// Capacity controller view
fn capacity_routes() -> Router<AppState> {
    Router::new().route("/capacity/status", get(handlers::capacity::status))
}

/// Health check
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
