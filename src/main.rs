mod config;
mod db;
mod drawing;
mod message;
mod routes;
mod services;
mod state;
mod store;
mod surface;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::store::{BoardStore, MemStore, PgStore};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config::Config::from_env().expect("invalid configuration");

    let store: Arc<dyn BoardStore> = match config.database_url.as_deref() {
        Some(url) => {
            let pool = db::init_pool(url, config.db_max_connections)
                .await
                .expect("database init failed");
            tracing::info!(max_connections = config.db_max_connections, "using postgres board store");
            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::info!("DATABASE_URL not set; using in-memory board store");
            Arc::new(MemStore::new())
        }
    };

    let addr = (config.bind_addr, config.port);
    let state = state::AppState::new(store, config);
    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");

    tracing::info!(bind_addr = %addr.0, port = addr.1, "whiteboard listening");
    axum::serve(listener, app).await.expect("server failed");
}
