//! WebSocket edge (spec §4.5 "WebSocket edge"): authenticates the upgrade
//! with a JWT passed as a query parameter (browsers cannot set a custom
//! header on the upgrade request), registers the connection, relays
//! bus-sourced events out, and republishes the client's inbound `beacon`,
//! `finder`, and `location.update` frames onto the bus (spec §6 "Client
//! surface").

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use bus::events::{UserBeacon, UserFinder};
use bus::Event;
use chrono::Utc;
use domain::services::Envelope;
use serde::Deserialize;
use shared::geo::GeoPoint;
use uuid::Uuid;

use crate::app::AppState;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub token: String,
}

/// Tagged inbound client frame (spec §6 "Inbound client messages").
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    Beacon {
        location: GeoPoint,
        #[serde(default = "default_active")]
        active: bool,
    },
    Finder {
        pickup: GeoPoint,
        destination: GeoPoint,
        #[serde(default = "default_active")]
        active: bool,
    },
    #[serde(rename = "location.update")]
    LocationUpdate { ride_id: Uuid, location: GeoPoint },
}

fn default_active() -> bool {
    true
}

pub async fn ws_handler(State(state): State<AppState>, Query(query): Query<WsQuery>, ws: WebSocketUpgrade) -> Response {
    let claims = match state.jwt_config.validate_access_token(&query.token) {
        Ok(c) => c,
        Err(err) => {
            tracing::warn!(error = %err, "websocket upgrade rejected: invalid token");
            return axum::http::StatusCode::UNAUTHORIZED.into_response();
        }
    };

    let Ok(user_id) = claims.sub.parse() else {
        return axum::http::StatusCode::UNAUTHORIZED.into_response();
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state, user_id))
}

async fn handle_socket(mut socket: WebSocket, state: AppState, user_id: uuid::Uuid) {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Message>();
    let index = state.registry.connect(user_id, tx.clone()).await;
    tracing::info!(%user_id, "websocket connected");

    loop {
        tokio::select! {
            outgoing = rx.recv() => {
                match outgoing {
                    Some(message) => {
                        if socket.send(message).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Text(text))) => {
                        handle_client_frame(&state, user_id, &text, &tx).await;
                    }
                    Some(Ok(_)) => {
                        // Binary/ping/pong frames carry no protocol meaning.
                    }
                    Some(Err(_)) => break,
                }
            }
        }
    }

    state.registry.disconnect(user_id, index).await;
    tracing::info!(%user_id, "websocket disconnected");
}

async fn handle_client_frame(
    state: &AppState,
    user_id: Uuid,
    text: &str,
    tx: &tokio::sync::mpsc::UnboundedSender<Message>,
) {
    let parsed: ClientMessage = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(err) => {
            send_error(tx, "validation_error", &err.to_string());
            return;
        }
    };

    let event = match parsed {
        ClientMessage::Beacon { location, active } => Event::UserBeacon(UserBeacon {
            driver_id: user_id,
            location,
            active,
            ts: Utc::now(),
        }),
        ClientMessage::Finder { pickup, destination, active } => Event::UserFinder(UserFinder {
            passenger_id: user_id,
            pickup,
            destination,
            active,
            ts: Utc::now(),
        }),
        ClientMessage::LocationUpdate { ride_id, location } => Event::LocationUpdate(bus::events::LocationUpdate {
            ride_id,
            user_id,
            location,
            ts: Utc::now(),
        }),
    };

    if let Err(err) = state.bus.publish(&event).await {
        tracing::error!(error = %err, %user_id, "failed to publish client event to bus");
        send_error(tx, "service_unavailable", "operation failed");
    }
}

fn send_error(tx: &tokio::sync::mpsc::UnboundedSender<Message>, code: &str, message: &str) {
    let envelope = Envelope::error(code, message);
    if let Ok(payload) = serde_json::to_string(&envelope) {
        let _ = tx.send(Message::Text(payload));
    }
}
