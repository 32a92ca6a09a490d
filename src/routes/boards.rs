//! Board REST routes.
//!
//! Plain JSON CRUD over the board store. There is no authentication: every
//! request acts as the configured default owner.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::drawing::BoardData;
use crate::message::ErrorCode;
use crate::state::AppState;
use crate::store::{Board, BoardPatch, BoardSession, NewBoard, StoreError};
use crate::surface::Surface;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("board {0} not found")]
    NotFound(i64),
    #[error("store failure: {0}")]
    Store(#[from] StoreError),
}

impl ErrorCode for ApiError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "E_BAD_REQUEST",
            Self::NotFound(_) => "E_NOT_FOUND",
            Self::Store(e) => e.error_code(),
        }
    }
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Store(e) => {
                error!(error = %e, code = e.error_code(), "api: store failure");
                "internal server error".to_owned()
            }
            other => other.to_string(),
        };
        (status, Json(serde_json::json!({ "message": message }))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

// =============================================================================
// BODIES
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBoardBody {
    pub name: Option<String>,
    pub owner_id: Option<i64>,
    pub data: Option<BoardData>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBoardBody {
    pub name: Option<String>,
    pub is_public: Option<bool>,
    /// Accepted only so it can be refused with a clear message.
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceQuery {
    /// Restrict the replayed strokes to one layer.
    pub layer: Option<String>,
}

fn required_name(name: Option<String>) -> Result<String, ApiError> {
    match name.map(|n| n.trim().to_owned()) {
        Some(n) if !n.is_empty() => Ok(n),
        _ => Err(ApiError::BadRequest("name must be a non-empty string".into())),
    }
}

async fn existing_board(state: &AppState, id: i64) -> Result<Board, ApiError> {
    state.store.get_board(id).await?.ok_or(ApiError::NotFound(id))
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `GET /api/boards` — boards of the default owner.
pub async fn list_boards(State(state): State<AppState>) -> Result<Json<Vec<Board>>, ApiError> {
    let boards = state.store.list_boards(state.config.default_owner_id).await?;
    Ok(Json(boards))
}

/// `POST /api/boards` — create a board.
pub async fn create_board(
    State(state): State<AppState>,
    body: Result<Json<CreateBoardBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Board>), ApiError> {
    let Json(body) = body?;
    let name = required_name(body.name)?;
    let data = body.data.unwrap_or_default();
    if let Err((index, e)) = data.validate() {
        return Err(ApiError::BadRequest(format!("event {index}: {e}")));
    }

    let board = state
        .store
        .create_board(NewBoard {
            name,
            owner_id: body.owner_id.unwrap_or(state.config.default_owner_id),
            data,
            is_public: body.is_public.unwrap_or(false),
        })
        .await?;
    info!(board_id = board.id, owner_id = board.owner_id, "api: board created");
    Ok((StatusCode::CREATED, Json(board)))
}

/// `GET /api/boards/:id` — fetch one board with its event log.
pub async fn get_board(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Board>, ApiError> {
    let Path(id) = id?;
    Ok(Json(existing_board(&state, id).await?))
}

/// `PUT /api/boards/:id` — rename or change visibility.
pub async fn update_board(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<UpdateBoardBody>, JsonRejection>,
) -> Result<Json<Board>, ApiError> {
    let Path(id) = id?;
    let Json(body) = body?;

    if body.data.is_some() {
        return Err(ApiError::BadRequest(
            "board events are append-only; send drawing events over /ws".into(),
        ));
    }
    let name = match body.name {
        Some(name) => Some(required_name(Some(name))?),
        None => None,
    };

    let patch = BoardPatch { name, is_public: body.is_public };
    let board = state
        .store
        .update_board(id, patch)
        .await?
        .ok_or(ApiError::NotFound(id))?;
    info!(board_id = id, "api: board updated");
    Ok(Json(board))
}

/// `DELETE /api/boards/:id`
pub async fn delete_board(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    if !state.store.delete_board(id).await? {
        return Err(ApiError::NotFound(id));
    }
    info!(board_id = id, "api: board deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/boards/:id/sessions` — active presence records.
///
/// Not gated on a stored board: the relay records sessions for any joined
/// board id, so an unknown id lists its live sessions (or none).
pub async fn list_sessions(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Vec<BoardSession>>, ApiError> {
    let Path(id) = id?;
    Ok(Json(state.store.active_sessions(id).await?))
}

/// `GET /api/boards/:id/surface` — the board's log replayed to visible strokes.
pub async fn board_surface(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    query: Result<Query<SurfaceQuery>, QueryRejection>,
) -> Result<Json<Surface>, ApiError> {
    let Path(id) = id?;
    let Query(query) = query?;
    let board = existing_board(&state, id).await?;
    let mut surface = Surface::replay(&board.data.events);
    if let Some(layer) = query.layer.as_deref() {
        surface.strokes = surface.layer(layer).cloned().collect();
    }
    debug!(board_id = id, strokes = surface.strokes.len(), applied = surface.applied, "api: surface replayed");
    Ok(Json(surface))
}

#[cfg(test)]
#[path = "boards_test.rs"]
mod tests;
