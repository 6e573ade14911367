//! HTTP route handlers.
//!
//! Each sub-module corresponds to one endpoint. The route table is built
//! explicitly by [`router`] and handed to `axum::serve` — there is no global
//! registration.

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::AppState;

pub mod health;
pub mod index;
pub mod whoami;

/// Build the application router with all routes bound to `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index::index))
        .route("/health", get(health::health))
        .route("/whoami", get(whoami::whoami))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
