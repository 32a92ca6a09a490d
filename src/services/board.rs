//! Board service — join/part, fan-out, and event recording.
//!
//! DESIGN
//! ======
//! The registry in `AppState::rooms` answers one question: who else is on
//! this board right now. Joining creates a session record and registers
//! the client's outbound channel; parting removes it and flags that one
//! session inactive. Presence counts always come from the store, so the
//! numbers clients see match `GET /api/boards/:id/sessions`.
//!
//! ERROR HANDLING
//! ==============
//! Broadcast is best-effort: a full or closed client queue is skipped, never
//! awaited. Store failures during part are logged and swallowed since the
//! connection is already gone.

use tokio::sync::mpsc;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::drawing::DrawingEvent;
use crate::message::{ErrorCode, ServerMessage};
use crate::state::{AppState, BoardRoom, ConnectedClient};
use crate::store::StoreError;

// =============================================================================
// TYPES
// =============================================================================

/// What a connection holds after a successful join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Presence {
    pub board_id: i64,
    pub user_id: i64,
    pub session_id: i64,
}

// =============================================================================
// JOIN / PART
// =============================================================================

/// Join a board: record a session, then register the client for fan-out.
///
/// # Errors
///
/// Returns a store error if the session cannot be recorded; the client is
/// not registered in that case.
pub async fn join_board(
    state: &AppState,
    board_id: i64,
    user_id: i64,
    client_id: Uuid,
    tx: mpsc::Sender<ServerMessage>,
) -> Result<Presence, StoreError> {
    let session = state.store.create_session(board_id, user_id).await?;

    let mut rooms = state.rooms.write().await;
    let room = rooms.entry(board_id).or_insert_with(BoardRoom::new);
    room.clients
        .insert(client_id, ConnectedClient { user_id, session_id: session.id, tx });

    info!(board_id, user_id, %client_id, session_id = session.id, clients = room.clients.len(), "client joined board");
    Ok(Presence { board_id, user_id, session_id: session.id })
}

/// Leave a board. Unregisters the client (dropping the board entry once it
/// is empty) and deactivates the session. Returns how many clients remain.
pub async fn part_board(state: &AppState, presence: Presence, client_id: Uuid) -> usize {
    let remaining = {
        let mut rooms = state.rooms.write().await;
        match rooms.get_mut(&presence.board_id) {
            Some(room) => {
                room.clients.remove(&client_id);
                let remaining = room.clients.len();
                if remaining == 0 {
                    rooms.remove(&presence.board_id);
                    debug!(board_id = presence.board_id, "dropped empty board room");
                }
                remaining
            }
            None => 0,
        }
    };

    if let Err(e) = state.store.deactivate_session(presence.session_id).await {
        error!(error = %e, code = e.error_code(), session_id = presence.session_id, "session deactivate failed");
    }

    info!(board_id = presence.board_id, user_id = presence.user_id, %client_id, remaining, "client left board");
    remaining
}

/// Number of active sessions recorded for a board.
///
/// # Errors
///
/// Returns a store error if the lookup fails.
pub async fn active_session_count(state: &AppState, board_id: i64) -> Result<usize, StoreError> {
    Ok(state.store.active_sessions(board_id).await?.len())
}

// =============================================================================
// BROADCAST
// =============================================================================

/// Broadcast a message to all clients on a board, optionally excluding one.
/// Returns how many clients it was queued for.
pub async fn broadcast(state: &AppState, board_id: i64, message: &ServerMessage, exclude: Option<Uuid>) -> usize {
    let rooms = state.rooms.read().await;
    let Some(room) = rooms.get(&board_id) else {
        return 0;
    };

    let mut delivered = 0;
    for (client_id, client) in &room.clients {
        if exclude == Some(*client_id) {
            continue;
        }
        // Best-effort: if a client's channel is full or closed, skip it.
        if client.tx.try_send(message.clone()).is_ok() {
            delivered += 1;
        } else {
            debug!(board_id, %client_id, user_id = client.user_id, session_id = client.session_id, "skipped client with full or closed queue");
        }
    }
    delivered
}

// =============================================================================
// EVENT LOG
// =============================================================================

/// Append a relayed drawing event to the board's stored log. Returns
/// `false` when the board has no stored document.
///
/// # Errors
///
/// Returns a store error if the append fails.
pub async fn record_drawing(state: &AppState, board_id: i64, event: &DrawingEvent) -> Result<bool, StoreError> {
    let stored = state.store.append_event(board_id, event).await?;
    if !stored {
        debug!(board_id, "drawing relayed for board without stored document; not persisted");
    }
    Ok(stored)
}

#[cfg(test)]
#[path = "board_test.rs"]
mod tests;
