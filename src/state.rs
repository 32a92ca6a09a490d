//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the board store and the live registry: a map from board id to
//! the clients currently connected to that board. The registry exists only
//! to fan drawing events out; it carries no board content.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::config::Config;
use crate::message::ServerMessage;
use crate::store::BoardStore;

// =============================================================================
// BOARD ROOM
// =============================================================================

/// A connection registered on a board.
#[derive(Debug, Clone)]
pub struct ConnectedClient {
    pub user_id: i64,
    pub session_id: i64,
    pub tx: mpsc::Sender<ServerMessage>,
}

/// Live clients of one board, keyed by connection id.
#[derive(Debug, Default)]
pub struct BoardRoom {
    pub clients: HashMap<Uuid, ConnectedClient>,
}

impl BoardRoom {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BoardStore>,
    pub rooms: Arc<RwLock<HashMap<i64, BoardRoom>>>,
    pub config: Arc<Config>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn BoardStore>, config: Config) -> Self {
        Self { store, rooms: Arc::new(RwLock::new(HashMap::new())), config: Arc::new(config) }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
#[path = "state_helpers_test.rs"]
pub mod test_helpers;

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
