//! WebSocket handler: per-scene message relay.
//!
//! DESIGN
//! ======
//! On upgrade, the connection joins its scene and enters a `select!` loop:
//! - Incoming client text → decode → relay to every client of the scene
//! - Broadcast envelopes from the scene → forward to the client
//!
//! The relay never interprets mesh edits. It owns presence, locks and the
//! `seq` stamp; everything else is forwarded as decoded.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade (401 without `?user=`) → join: `meta` to the client, `join` to all
//! 2. Client text → `process_inbound_text` → broadcast, or `error` reply
//! 3. Close → part: locks released, `leave` to the remaining clients

#[cfg(test)]
#[path = "ws_test.rs"]
mod ws_test;

use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use protocol::{Envelope, ErrorCode, Message};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::services::scene::{self, RelayError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EditParams {
    user: Option<String>,
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(
    State(state): State<AppState>,
    Path(scene_id): Path<String>,
    Query(params): Query<EditParams>,
    ws: WebSocketUpgrade,
) -> Response {
    let Some(user) = params.user.filter(|u| !u.trim().is_empty()) else {
        return (StatusCode::UNAUTHORIZED, "user required").into_response();
    };

    ws.on_upgrade(move |socket| run_ws(socket, state, scene_id, user))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState, scene_id: String, user: String) {
    let client_id = Uuid::new_v4();

    // Per-connection channel for receiving broadcasts from the scene.
    let (client_tx, mut client_rx) = mpsc::channel::<Envelope>(state.config.client_channel_capacity);

    let meta = scene::join_scene(&state, &scene_id, client_id, &user, client_tx).await;
    info!(%scene_id, %client_id, %user, "ws: client connected");

    if send_envelope(&mut socket, &meta).await.is_ok() {
        'conn: loop {
            tokio::select! {
                msg = socket.recv() => {
                    let Some(Ok(msg)) = msg else { break 'conn };
                    match msg {
                        WsMessage::Text(text) => {
                            for reply in process_inbound_text(&state, &scene_id, client_id, &text).await {
                                if send_envelope(&mut socket, &reply).await.is_err() {
                                    break 'conn;
                                }
                            }
                        }
                        WsMessage::Close(_) => break 'conn,
                        _ => {}
                    }
                }
                Some(envelope) = client_rx.recv() => {
                    if send_envelope(&mut socket, &envelope).await.is_err() {
                        break 'conn;
                    }
                }
            }
        }
    }

    scene::part_scene(&state, &scene_id, client_id).await;
    info!(%scene_id, %client_id, %user, "ws: client disconnected");
}

// =============================================================================
// INBOUND
// =============================================================================

/// Decode and relay one inbound text frame and return frames for the sender.
///
/// Relayed messages reach the sender through its scene channel like every
/// other client, so a successful relay returns nothing here.
async fn process_inbound_text(state: &AppState, scene_id: &str, client_id: Uuid, text: &str) -> Vec<Envelope> {
    let result = match protocol::decode(text) {
        Ok(envelope) => scene::relay(state, scene_id, client_id, envelope.message).await,
        Err(e) => Err(RelayError::from(e)),
    };
    match result {
        Ok(seq) => {
            debug!(%scene_id, %client_id, seq, "ws: relayed");
            Vec::new()
        }
        Err(e) => {
            warn!(%scene_id, %client_id, code = e.error_code(), error = %e, "ws: inbound message rejected");
            vec![Envelope::new(Message::Error { message: e.to_string() })]
        }
    }
}

async fn send_envelope(socket: &mut WebSocket, envelope: &Envelope) -> Result<(), axum::Error> {
    match protocol::encode(envelope) {
        Ok(text) => socket.send(WsMessage::Text(text.into())).await,
        Err(e) => {
            warn!(kind = envelope.message.kind(), error = %e, "ws: encode failed");
            Ok(())
        }
    }
}
