// file: src/server/mod.rs
// description: axum HTTP surface for uploads, documents and queries

pub mod routes;
pub mod state;

pub use state::AppState;

use crate::config::Config;
use crate::error::Result;
use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub fn build_router(state: Arc<AppState>) -> Router {
    // multipart framing overhead on top of the per-file cap
    let body_limit = state.config.max_file_size_bytes() as usize + 1024 * 1024;

    Router::new()
        .route("/upload", post(routes::upload))
        .route("/documents", get(routes::list_documents))
        .route("/documents", delete(routes::delete_document))
        .route("/query", post(routes::query))
        .route("/stats", get(routes::stats))
        .route("/health", get(routes::health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(config: Config) -> Result<()> {
    let state = Arc::new(AppState::new(&config).await?);

    // rebuild the index from files already on disk without blocking bind,
    // then pull in the configured website's pages
    let startup_state = state.clone();
    tokio::spawn(async move {
        startup_state.reindex_existing().await;
        startup_state.crawl_configured_site().await;
    });

    let router = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, router).await?;
    Ok(())
}
