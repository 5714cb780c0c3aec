//! Route definitions for the dashboard API

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Creates the main application router with all routes and middleware
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Dashboard page
        .route("/", get(handlers::dashboard_page))
        // Health check
        .route("/health", get(handlers::health_check))
        // Filter widget options
        .route("/filters", get(handlers::get_filters))
        // Scoring views
        .route("/scoring", get(handlers::get_scoring))
        .route("/scoring/table", get(handlers::get_scoring_table))
        .route("/scoring/flow", get(handlers::get_scoring_flow))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
