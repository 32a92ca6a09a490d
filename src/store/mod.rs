//! Board persistence behind a single async trait.
//!
//! ARCHITECTURE
//! ============
//! Route handlers and the realtime relay only see `Arc<dyn BoardStore>`.
//! `MemStore` keeps everything in process memory (a restart loses all
//! boards and sessions); `PgStore` writes the same documents to Postgres
//! when `DATABASE_URL` is configured.
//!
//! INVARIANTS
//! ==========
//! - Board and session ids are assigned from 1 upward and never reused.
//! - `append_event` is the only way the event log changes, and it only
//!   ever grows.
//! - Sessions are flagged inactive, never deleted.

pub mod memory;
pub mod postgres;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::drawing::{BoardData, DrawingEvent};
use crate::message::ErrorCode;

pub use memory::MemStore;
pub use postgres::PgStore;

// =============================================================================
// TYPES
// =============================================================================

/// A board document with its event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: i64,
    pub name: String,
    pub owner_id: i64,
    pub data: BoardData,
    pub is_public: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Fields accepted when creating a board.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBoard {
    pub name: String,
    pub owner_id: i64,
    pub data: BoardData,
    pub is_public: bool,
}

/// Partial update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardPatch {
    pub name: Option<String>,
    pub is_public: Option<bool>,
}

/// One user's presence on one board between join and disconnect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSession {
    pub id: i64,
    pub board_id: i64,
    pub user_id: i64,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub joined_at: OffsetDateTime,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("corrupt board data for board {board_id}: {source}")]
    CorruptData {
        board_id: i64,
        #[source]
        source: serde_json::Error,
    },
}

impl ErrorCode for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Database(_) => "E_DATABASE",
            Self::CorruptData { .. } => "E_CORRUPT_DATA",
        }
    }
}

// =============================================================================
// TRAIT
// =============================================================================

#[async_trait::async_trait]
pub trait BoardStore: Send + Sync {
    async fn get_board(&self, id: i64) -> Result<Option<Board>, StoreError>;

    /// Boards owned by `owner_id`, ordered by id.
    async fn list_boards(&self, owner_id: i64) -> Result<Vec<Board>, StoreError>;

    async fn create_board(&self, new: NewBoard) -> Result<Board, StoreError>;

    /// Apply a partial update and bump `updated_at`. `None` if missing.
    async fn update_board(&self, id: i64, patch: BoardPatch) -> Result<Option<Board>, StoreError>;

    /// Returns whether a board was removed.
    async fn delete_board(&self, id: i64) -> Result<bool, StoreError>;

    /// Append one event to the board's log. Returns `false` (and stores
    /// nothing) when the board does not exist.
    async fn append_event(&self, board_id: i64, event: &DrawingEvent) -> Result<bool, StoreError>;

    async fn create_session(&self, board_id: i64, user_id: i64) -> Result<BoardSession, StoreError>;

    /// Sessions on `board_id` that are still active, ordered by id.
    async fn active_sessions(&self, board_id: i64) -> Result<Vec<BoardSession>, StoreError>;

    /// Flag a session inactive. Returns whether an active session changed.
    async fn deactivate_session(&self, session_id: i64) -> Result<bool, StoreError>;
}
