use std::path::Path;

use axum::{middleware, routing::get, Router};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use super::handlers;
use super::AppState;
use crate::middleware::{make_span_with_request_id, request_id_middleware};

/// Creates the JSON API router with all routes
pub fn create_router(state: AppState) -> Router {
    with_layers(api_routes(state))
}

/// Creates the API router plus the shell assets served from `static_dir`
pub fn create_app(state: AppState, static_dir: &Path) -> Router {
    with_layers(static_routes(api_routes(state), static_dir))
}

fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/search", get(handlers::search))
        .route("/api/results", get(handlers::results))
        .route("/api/discover", get(handlers::discover))
        .route("/api/spotlight", get(handlers::spotlight))
        .route("/api/title_min/:id", get(handlers::title_min))
        .route("/api/title/:id", get(handlers::title))
        .route("/download/:file", get(handlers::download))
        .with_state(state)
}

fn static_routes(router: Router, dir: &Path) -> Router {
    router
        .route_service("/", ServeFile::new(dir.join("index.html")))
        .route_service(
            "/manifest.webmanifest",
            ServeFile::new(dir.join("manifest.webmanifest")),
        )
        .nest_service("/static", ServeDir::new(dir))
}

/// Layers only wrap routes added before them
fn with_layers(router: Router) -> Router {
    router
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
}
