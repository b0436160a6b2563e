//! Route definitions

use axum::{
    routing::{get, post},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::HttpConfig;
use crate::AppState;

use super::api;

/// Create the main router with all routes
pub fn create_router(app_state: Arc<AppState>, config: &HttpConfig, models_dir: &Path) -> Router {
    let cors = if config.cors_enabled {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    Router::new()
        // Queries
        .route("/api/status", get(api::get_status))
        .route("/api/config", get(api::get_config))
        .route("/api/stream", get(api::event_stream))
        // UI events
        .route("/api/calibration/advance", post(api::advance_calibration))
        .route("/api/options", post(api::set_option))
        .route(
            "/api/overrides",
            post(api::set_override).delete(api::clear_override),
        )
        .route("/api/focus", post(api::set_focus))
        .route("/api/pause", post(api::pause))
        .route("/api/resume", post(api::resume))
        .route("/api/model", post(api::set_model))
        // Model assets for the browser renderer
        .nest_service("/models", ServeDir::new(models_dir))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
