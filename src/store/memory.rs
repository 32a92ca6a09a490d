//! In-memory board store.
//!
//! Everything lives behind one `RwLock`; ids come from per-table counters.

use std::collections::BTreeMap;

use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::{Board, BoardPatch, BoardSession, BoardStore, NewBoard, StoreError};
use crate::drawing::DrawingEvent;

#[derive(Default)]
struct Tables {
    boards: BTreeMap<i64, Board>,
    sessions: BTreeMap<i64, BoardSession>,
    last_board_id: i64,
    last_session_id: i64,
}

#[derive(Default)]
pub struct MemStore {
    tables: RwLock<Tables>,
}

impl MemStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl BoardStore for MemStore {
    async fn get_board(&self, id: i64) -> Result<Option<Board>, StoreError> {
        Ok(self.tables.read().await.boards.get(&id).cloned())
    }

    async fn list_boards(&self, owner_id: i64) -> Result<Vec<Board>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .boards
            .values()
            .filter(|b| b.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn create_board(&self, new: NewBoard) -> Result<Board, StoreError> {
        let mut tables = self.tables.write().await;
        tables.last_board_id += 1;
        let now = OffsetDateTime::now_utc();
        let board = Board {
            id: tables.last_board_id,
            name: new.name,
            owner_id: new.owner_id,
            data: new.data,
            is_public: new.is_public,
            created_at: now,
            updated_at: now,
        };
        tables.boards.insert(board.id, board.clone());
        Ok(board)
    }

    async fn update_board(&self, id: i64, patch: BoardPatch) -> Result<Option<Board>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(board) = tables.boards.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = patch.name {
            board.name = name;
        }
        if let Some(is_public) = patch.is_public {
            board.is_public = is_public;
        }
        board.updated_at = OffsetDateTime::now_utc();
        Ok(Some(board.clone()))
    }

    async fn delete_board(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.tables.write().await.boards.remove(&id).is_some())
    }

    async fn append_event(&self, board_id: i64, event: &DrawingEvent) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(board) = tables.boards.get_mut(&board_id) else {
            return Ok(false);
        };
        board.data.events.push(event.clone());
        board.updated_at = OffsetDateTime::now_utc();
        Ok(true)
    }

    async fn create_session(&self, board_id: i64, user_id: i64) -> Result<BoardSession, StoreError> {
        let mut tables = self.tables.write().await;
        tables.last_session_id += 1;
        let session = BoardSession {
            id: tables.last_session_id,
            board_id,
            user_id,
            is_active: true,
            joined_at: OffsetDateTime::now_utc(),
        };
        tables.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn active_sessions(&self, board_id: i64) -> Result<Vec<BoardSession>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .sessions
            .values()
            .filter(|s| s.board_id == board_id && s.is_active)
            .cloned()
            .collect())
    }

    async fn deactivate_session(&self, session_id: i64) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        match tables.sessions.get_mut(&session_id) {
            Some(session) if session.is_active => {
                session.is_active = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
