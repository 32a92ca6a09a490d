//! Postgres board store.
//!
//! DESIGN
//! ======
//! Boards keep their event log in a `data` JSONB column shaped exactly like
//! the API document (`{"events": [...]}`). Appends are a single
//! `UPDATE ... SET data = jsonb_set(...)` so concurrent writers never lose
//! each other's events through a read-modify-write race.

use sqlx::PgPool;
use sqlx::types::Json;
use time::OffsetDateTime;

use super::{Board, BoardPatch, BoardSession, BoardStore, NewBoard, StoreError};
use crate::drawing::{BoardData, DrawingEvent};

const BOARD_COLUMNS: &str = "id, name, owner_id, data, is_public, created_at, updated_at";
const SESSION_COLUMNS: &str = "id, board_id, user_id, is_active, joined_at";

type BoardTuple = (i64, String, i64, serde_json::Value, bool, OffsetDateTime, OffsetDateTime);
type SessionTuple = (i64, i64, i64, bool, OffsetDateTime);

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn board_from_row(row: BoardTuple) -> Result<Board, StoreError> {
    let (id, name, owner_id, data, is_public, created_at, updated_at) = row;
    let data: BoardData =
        serde_json::from_value(data).map_err(|source| StoreError::CorruptData { board_id: id, source })?;
    Ok(Board { id, name, owner_id, data, is_public, created_at, updated_at })
}

fn session_from_row(row: SessionTuple) -> BoardSession {
    let (id, board_id, user_id, is_active, joined_at) = row;
    BoardSession { id, board_id, user_id, is_active, joined_at }
}

#[async_trait::async_trait]
impl BoardStore for PgStore {
    async fn get_board(&self, id: i64) -> Result<Option<Board>, StoreError> {
        let row = sqlx::query_as::<_, BoardTuple>(&format!("SELECT {BOARD_COLUMNS} FROM boards WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(board_from_row).transpose()
    }

    async fn list_boards(&self, owner_id: i64) -> Result<Vec<Board>, StoreError> {
        let rows = sqlx::query_as::<_, BoardTuple>(&format!(
            "SELECT {BOARD_COLUMNS} FROM boards WHERE owner_id = $1 ORDER BY id ASC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(board_from_row).collect()
    }

    async fn create_board(&self, new: NewBoard) -> Result<Board, StoreError> {
        let row = sqlx::query_as::<_, BoardTuple>(&format!(
            "INSERT INTO boards (name, owner_id, data, is_public) VALUES ($1, $2, $3, $4) RETURNING {BOARD_COLUMNS}"
        ))
        .bind(&new.name)
        .bind(new.owner_id)
        .bind(Json(&new.data))
        .bind(new.is_public)
        .fetch_one(&self.pool)
        .await?;
        board_from_row(row)
    }

    async fn update_board(&self, id: i64, patch: BoardPatch) -> Result<Option<Board>, StoreError> {
        let row = sqlx::query_as::<_, BoardTuple>(&format!(
            "UPDATE boards SET \
                 name = COALESCE($2, name), \
                 is_public = COALESCE($3, is_public), \
                 updated_at = now() \
             WHERE id = $1 RETURNING {BOARD_COLUMNS}"
        ))
        .bind(id)
        .bind(patch.name)
        .bind(patch.is_public)
        .fetch_optional(&self.pool)
        .await?;
        row.map(board_from_row).transpose()
    }

    async fn delete_board(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM boards WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn append_event(&self, board_id: i64, event: &DrawingEvent) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE boards SET \
                 data = jsonb_set(data, '{events}', COALESCE(data->'events', '[]'::jsonb) || jsonb_build_array($2::jsonb)), \
                 updated_at = now() \
             WHERE id = $1",
        )
        .bind(board_id)
        .bind(Json(event))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_session(&self, board_id: i64, user_id: i64) -> Result<BoardSession, StoreError> {
        let row = sqlx::query_as::<_, SessionTuple>(&format!(
            "INSERT INTO board_sessions (board_id, user_id) VALUES ($1, $2) RETURNING {SESSION_COLUMNS}"
        ))
        .bind(board_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(session_from_row(row))
    }

    async fn active_sessions(&self, board_id: i64) -> Result<Vec<BoardSession>, StoreError> {
        let rows = sqlx::query_as::<_, SessionTuple>(&format!(
            "SELECT {SESSION_COLUMNS} FROM board_sessions WHERE board_id = $1 AND is_active ORDER BY id ASC"
        ))
        .bind(board_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(session_from_row).collect())
    }

    async fn deactivate_session(&self, session_id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE board_sessions SET is_active = FALSE WHERE id = $1 AND is_active")
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(all(test, feature = "live-db-tests"))]
#[path = "postgres_test.rs"]
mod tests;
