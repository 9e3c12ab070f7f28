//! `rmoldtracker serve` -- HTTP JSON API over the SQLite record store.
//!
//! Endpoints:
//! - GET    /health                - Server status
//! - GET    /mold-changes          - All records, most recent start first
//! - POST   /mold-changes          - Create a record (201)
//! - POST   /mold-changes/claim    - Create a pending record unless one is active (201 / 409)
//! - PATCH  /mold-changes/{id}     - Partial update (404 / 400)
//! - DELETE /mold-changes/{id}     - Hard delete (204 / 404)
//!
//! Bodies and responses use camelCase JSON; errors are `{"error": "..."}`.

mod handlers;

use crate::errors::{AppError, AppResult};
use crate::store::RecordStore;
use axum::Router;
use axum::http::Method;
use axum::routing::{get, patch, post};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

/// Shared state handed to every handler.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) store: Arc<dyn RecordStore>,
}

/// Build the router. Kept separate from `serve` so tests can bind their own
/// listener.
pub fn router(store: Arc<dyn RecordStore>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/mold-changes",
            get(handlers::list_changes).post(handlers::create_change),
        )
        .route("/mold-changes/claim", post(handlers::claim_change))
        .route(
            "/mold-changes/{id}",
            patch(handlers::update_change).delete(handlers::delete_change),
        )
        .fallback(handlers::not_found)
        .layer(cors)
        .with_state(AppState { store })
}

/// Bind `bind_addr` and serve until Ctrl+C.
pub async fn serve(store: Arc<dyn RecordStore>, bind_addr: &str) -> AppResult<()> {
    let listener = TcpListener::bind(bind_addr).await?;
    serve_on(listener, store, shutdown_signal()).await
}

/// Serve on an already bound listener until `shutdown` resolves.
pub async fn serve_on<F>(
    listener: TcpListener,
    store: Arc<dyn RecordStore>,
    shutdown: F,
) -> AppResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "mold-change API listening");

    axum::serve(listener, router(store))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| AppError::Other(format!("server error: {e}")))?;

    tracing::info!("server shut down");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("received shutdown signal");
}
