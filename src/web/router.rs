//! Router configuration for Web API.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;

use super::handlers::{
    delete_file, download_file, list_files, login, logout, rename_file, upload_file, AppState,
};
use super::middleware::{create_cors_layer, token_auth};

/// Room for multipart boundaries and the `filename` field on top of the file.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Create the main API router.
///
/// API routes are nested under `config.base_path`; `/health` stays at the
/// root.
pub fn create_router(app_state: Arc<AppState>, config: &ServerConfig) -> Router {
    let api_routes = Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/list", get(list_files))
        .route(
            "/file",
            get(download_file)
                .post(upload_file)
                .put(rename_file)
                .delete(delete_file),
        );

    let body_limit = usize::try_from(app_state.max_upload_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    let base_path = config.base_path.trim_end_matches('/');
    let router = if base_path.is_empty() {
        Router::new().merge(api_routes)
    } else {
        Router::new().nest(base_path, api_routes)
    };

    let state_for_middleware = app_state.clone();

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(&config.cors_origins))
                .layer(DefaultBodyLimit::max(body_limit))
                .layer(middleware::from_fn(move |req, next| {
                    let state = state_for_middleware.clone();
                    token_auth(state, req, next)
                })),
        )
        .with_state(app_state)
        .merge(create_health_router())
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
