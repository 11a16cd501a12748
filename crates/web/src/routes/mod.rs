//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                - Rates page (loading, then updated over SSE)
//! GET  /rates           - Rates section fragment (HTMX)
//! GET  /rates/stream    - Rates section per state transition (SSE)
//! GET  /health          - Health check
//! ```
//!
//! Every rates route accepts `?refresh=true` to bypass the response cache.

pub mod rates;

use axum::{Router, http::Uri, routing::get};
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::state::AppState;

/// Create the rates routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(rates::index))
        .route("/rates", get(rates::fragment))
        .route("/rates/stream", get(rates::stream))
}

/// Build the complete application router with state applied.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(routes())
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the GraphQL endpoint.
async fn health() -> &'static str {
    "ok"
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}
