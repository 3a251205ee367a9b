//! Demo Copilot HTTP API.

pub mod config;
pub mod error;
pub mod events;
pub mod rehearsal;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Builds the full application router.
pub fn app(state: AppState) -> Router {
    // TODO: restrict CORS to the presenter console origin once it is configurable.
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/demos", routes::demo::router())
        .nest("/api/v1/events", routes::events::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
