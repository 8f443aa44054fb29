//! Realtime presence socket.

use axum::extract::State;
use axum::extract::WebSocketUpgrade;
use axum::extract::ws::{Message, WebSocket};
use axum::response::Response;
use tracing::{debug, info, warn};

use reportal_capacity::PresenceSignal;

use crate::dto::request::ClientEvent;
use crate::state::AppState;

/// Per-socket visibility, so one socket never counts twice.
#[derive(Debug, Default)]
pub struct SocketPresence {
    away: bool,
}

impl SocketPresence {
    /// Signal to forward for a client frame, if any.
    pub fn on_event(&mut self, event: ClientEvent) -> Option<PresenceSignal> {
        match (event, self.away) {
            (ClientEvent::Away, false) => {
                self.away = true;
                Some(PresenceSignal::Away)
            }
            (ClientEvent::Active, true) => {
                self.away = false;
                Some(PresenceSignal::Active)
            }
            _ => None,
        }
    }

    /// Signal to forward when the socket closes. An away socket was already
    /// uncounted.
    pub fn on_close(&self) -> Option<PresenceSignal> {
        (!self.away).then_some(PresenceSignal::Disconnect)
    }
}

/// GET /ws: WebSocket upgrade
pub async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_ws_connection(state, socket))
}

/// Handles an established WebSocket connection.
async fn handle_ws_connection(state: AppState, mut socket: WebSocket) {
    if let Err(e) = state.capacity.presence(PresenceSignal::Connect).await {
        warn!(error = %e, "Dropping WebSocket; capacity controller unavailable");
        return;
    }
    info!("WebSocket connection established");

    let mut presence = SocketPresence::default();

    while let Some(result) = socket.recv().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientEvent>(text.as_str()) {
                Ok(event) => {
                    if let Some(signal) = presence.on_event(event) {
                        if let Err(e) = state.capacity.presence(signal).await {
                            warn!(error = %e, "Failed to forward presence signal");
                            break;
                        }
                    }
                }
                Err(e) => debug!(error = %e, "Ignoring malformed WebSocket frame"),
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "WebSocket error");
                break;
            }
        }
    }

    if let Some(signal) = presence.on_close() {
        if let Err(e) = state.capacity.presence(signal).await {
            warn!(error = %e, "Failed to forward disconnect");
        }
    }

    info!("WebSocket connection closed");
}
