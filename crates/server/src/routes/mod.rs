//! HTTP router assembly.

pub mod health;
pub mod notifications;

use axum::middleware;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::middleware::correlation_id;
use crate::state::AppState;

/// Build the complete application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(notifications::router())
        .layer(middleware::from_fn(correlation_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
