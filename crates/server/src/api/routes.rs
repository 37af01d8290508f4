use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::{cache, catalog, handlers, settings, sources, streams, subtitles, ws};
use super::middleware::metrics_middleware;
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health, config and metrics
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::metrics))
        // Source search
        .route("/sources/search", post(sources::search))
        // Streaming sessions
        .route("/streams/start", post(streams::start))
        .route("/streams/stop", post(streams::stop))
        .route("/streams/stop-active", post(streams::stop_active))
        .route("/streams/active", get(streams::active))
        .route("/streams/progress", get(ws::progress_ws))
        // Bandwidth, cache and settings
        .route("/bandwidth", put(settings::update_bandwidth))
        .route("/cache/clear", post(cache::clear))
        .route("/settings/reload", post(settings::reload))
        // Subtitles and metadata
        .route("/subtitles/{imdb_id}", get(subtitles::search))
        .route("/catalog/search", get(catalog::search))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
