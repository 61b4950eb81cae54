use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{audio, handlers, middleware::metrics_middleware, scanner};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Scan loop
        .route("/scanner/status", get(scanner::get_status))
        .route("/scanner/start", post(scanner::start))
        .route("/scanner/stop", post(scanner::stop))
        .route("/scanner/scan", post(scanner::manual_scan))
        // Host tools
        .route("/dependencies", get(scanner::get_dependencies))
        .route("/dependencies/check", post(scanner::check_dependencies))
        // Audio
        .route("/audio", get(audio::get_status))
        .route("/audio/start", post(audio::start))
        .route("/audio/stop", post(audio::stop))
        .route("/audio/tune", post(audio::tune));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
