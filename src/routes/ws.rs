//! WebSocket handler — realtime drawing relay.
//!
//! DESIGN
//! ======
//! On upgrade, generates a client ID and enters a `select!` loop:
//! - Incoming client messages → parse + dispatch by `type`
//! - Messages queued by board peers → forward to client
//!
//! Handler functions validate, mutate state, and return an `Outcome`. The
//! dispatch layer owns the fan-out: who on the board receives what.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → connection has no board yet
//! 2. `join` → session recorded, `user_joined` to every member
//! 3. `drawing` → appended to the board log, relayed to the other members
//! 4. Close → session deactivated, `user_left` to the remaining members
//!
//! Nothing is ever replied to the sender alone. Bad input is logged and
//! dropped; the connection stays open.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::drawing::DrawingEvent;
use crate::message::{ClientMessage, ErrorCode, ServerMessage};
use crate::services;
use crate::services::board::Presence;
use crate::state::AppState;

// =============================================================================
// OUTCOME
// =============================================================================

/// Result returned by handler functions. The dispatch layer uses this to
/// decide who receives what; handlers never send directly.
#[derive(Debug)]
enum Outcome {
    /// Send to ALL board clients including the sender.
    Broadcast(ServerMessage),
    /// Send to every board peer EXCEPT the sender.
    BroadcastExcludeSender(ServerMessage),
    /// Nothing to send.
    Drop,
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let client_id = Uuid::new_v4();

    // Per-connection queue for messages fanned out by board peers.
    let (client_tx, mut client_rx) = mpsc::channel::<ServerMessage>(state.config.ws_client_buffer);

    info!(%client_id, "ws: client connected");

    let mut presence: Option<Presence> = None;

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(msg) = msg else { break };
                let msg = match msg {
                    Ok(msg) => msg,
                    Err(e) => {
                        debug!(%client_id, error = %e, "ws: receive failed");
                        break;
                    }
                };
                match msg {
                    Message::Text(text) => {
                        process_inbound_text(&state, &mut presence, client_id, &client_tx, text.as_str()).await;
                    }
                    Message::Binary(bytes) => match std::str::from_utf8(&bytes) {
                        Ok(text) => process_inbound_text(&state, &mut presence, client_id, &client_tx, text).await,
                        Err(e) => warn!(%client_id, error = %e, code = "E_MALFORMED", "ws: non-utf8 binary message dropped"),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(message) = client_rx.recv() => {
                if send_message(&mut socket, client_id, &message).await.is_err() {
                    break;
                }
            }
        }
    }

    if let Some(presence) = presence {
        leave_board(&state, presence, client_id).await;
    }
    info!(%client_id, "ws: client disconnected");
}

async fn send_message(socket: &mut WebSocket, client_id: Uuid, message: &ServerMessage) -> Result<(), axum::Error> {
    let json = match message.to_json() {
        Ok(json) => json,
        Err(e) => {
            error!(%client_id, error = %e, "ws: failed to encode outbound message");
            return Ok(());
        }
    };
    socket.send(Message::Text(json.into())).await.inspect_err(|e| {
        debug!(%client_id, error = %e, "ws: send failed");
    })
}

// =============================================================================
// DISPATCH
// =============================================================================

/// Parse one inbound text message, dispatch it, and fan out the outcome.
///
/// Kept separate from the socket so tests can drive the relay with plain
/// channels.
async fn process_inbound_text(
    state: &AppState,
    presence: &mut Option<Presence>,
    client_id: Uuid,
    client_tx: &mpsc::Sender<ServerMessage>,
    text: &str,
) {
    let msg = match ClientMessage::parse(text) {
        Ok(msg) => msg,
        Err(e) => {
            warn!(%client_id, error = %e, code = e.error_code(), "ws: inbound message dropped");
            return;
        }
    };

    let outcome = match msg {
        ClientMessage::Join { board_id, user_id } => {
            handle_join(state, presence, client_id, client_tx, board_id, user_id).await
        }
        ClientMessage::Drawing { event } => handle_drawing(state, *presence, client_id, event).await,
    };

    let Some(board_id) = presence.map(|p| p.board_id) else {
        return;
    };
    match outcome {
        Outcome::Broadcast(message) => {
            services::board::broadcast(state, board_id, &message, None).await;
        }
        Outcome::BroadcastExcludeSender(message) => {
            services::board::broadcast(state, board_id, &message, Some(client_id)).await;
        }
        Outcome::Drop => {}
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

async fn handle_join(
    state: &AppState,
    presence: &mut Option<Presence>,
    client_id: Uuid,
    client_tx: &mpsc::Sender<ServerMessage>,
    board_id: i64,
    user_id: i64,
) -> Outcome {
    // One board per connection: joining elsewhere leaves the old board.
    if let Some(previous) = presence.take() {
        leave_board(state, previous, client_id).await;
    }

    let joined = match services::board::join_board(state, board_id, user_id, client_id, client_tx.clone()).await {
        Ok(joined) => joined,
        Err(e) => {
            error!(%client_id, board_id, user_id, error = %e, code = e.error_code(), "ws: join failed");
            return Outcome::Drop;
        }
    };
    *presence = Some(joined);

    match services::board::active_session_count(state, board_id).await {
        Ok(active_sessions) => Outcome::Broadcast(ServerMessage::UserJoined { user_id, active_sessions }),
        Err(e) => {
            error!(%client_id, board_id, error = %e, code = e.error_code(), "ws: session count failed");
            Outcome::Drop
        }
    }
}

async fn handle_drawing(
    state: &AppState,
    presence: Option<Presence>,
    client_id: Uuid,
    event: DrawingEvent,
) -> Outcome {
    let Some(presence) = presence else {
        warn!(%client_id, code = "E_NOT_JOINED", "ws: drawing before join dropped");
        return Outcome::Drop;
    };

    // A failed append is logged; peers still see the stroke.
    if let Err(e) = services::board::record_drawing(state, presence.board_id, &event).await {
        error!(%client_id, board_id = presence.board_id, error = %e, code = e.error_code(), "ws: drawing not persisted");
    }

    debug!(%client_id, board_id = presence.board_id, kind = ?event.kind, "ws: relay drawing");
    Outcome::BroadcastExcludeSender(ServerMessage::Drawing { event })
}

/// Part a board and tell the remaining members.
async fn leave_board(state: &AppState, presence: Presence, client_id: Uuid) {
    let remaining = services::board::part_board(state, presence, client_id).await;
    if remaining == 0 {
        return;
    }

    match services::board::active_session_count(state, presence.board_id).await {
        Ok(active_sessions) => {
            let message = ServerMessage::UserLeft { user_id: presence.user_id, active_sessions };
            services::board::broadcast(state, presence.board_id, &message, Some(client_id)).await;
        }
        Err(e) => {
            error!(%client_id, board_id = presence.board_id, error = %e, code = e.error_code(), "ws: session count failed");
        }
    }
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
