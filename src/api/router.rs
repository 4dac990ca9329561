use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::state::SharedState;

/// Build the Axum router with all routes and middleware.
pub fn create_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check (outside /api prefix)
        .route("/health", get(handlers::health))
        // Session lifecycle
        .route("/api/sessions", post(handlers::create_session))
        .route(
            "/api/sessions/{id}",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        .route("/api/sessions/{id}/begin", post(handlers::begin_session))
        .route("/api/sessions/{id}/trials", post(handlers::next_trial))
        .route("/api/sessions/{id}/response", post(handlers::respond))
        .route("/api/sessions/{id}/finish", post(handlers::finish_session))
        // Reporting
        .route("/api/sessions/{id}/results", get(handlers::get_results))
        .route("/api/sessions/{id}/export", get(handlers::export_csv))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
