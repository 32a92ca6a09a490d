//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the board REST API, the `/ws` realtime relay, and an
//! optional static client under a single Axum router. Compression applies
//! to the REST API only so websocket upgrades pass through untouched.

pub mod boards;
pub mod ws;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::get;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/boards", get(boards::list_boards).post(boards::create_board))
        .route(
            "/api/boards/{id}",
            get(boards::get_board)
                .put(boards::update_board)
                .delete(boards::delete_board),
        )
        .route("/api/boards/{id}/sessions", get(boards::list_sessions))
        .route("/api/boards/{id}/surface", get(boards::board_surface))
        .layer(CompressionLayer::new())
}

/// Build the full application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let router = Router::new()
        .merge(api_routes())
        .route("/ws", get(ws::handle_ws))
        .route("/healthz", get(healthz));

    // Fallback goes on before the layers so static files are traced and get CORS.
    let router = match state.config.static_dir.clone() {
        Some(dir) => {
            let index = dir.join("index.html");
            let static_files = ServeDir::new(dir)
                .append_index_html_on_directories(true)
                .fallback(ServeFile::new(index));
            router.fallback_service(static_files)
        }
        None => router,
    };

    let router = router
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    router.with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
