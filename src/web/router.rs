//! Router configuration for the Web API.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    download, login, save_smtp_settings, test_smtp, transfer_details, upload, AppState,
};
use super::middleware::{create_cors_layer, jwt_auth, JwtState};

/// Create the main API router.
pub fn create_router(app_state: Arc<AppState>, jwt_state: Arc<JwtState>) -> Router {
    let cors_origins = app_state.config.server.cors_origins.clone();
    let max_upload_bytes = app_state.config.storage.max_upload_size_mb as usize * 1024 * 1024;

    // Public routes: upload and capability-id access
    let public_routes = Router::new()
        .route("/upload", post(upload))
        .route("/transfer/:id", get(transfer_details))
        .route("/download/:id", get(download))
        .route("/login", post(login));

    // Admin routes: the AuthUser extractor enforces the session token
    let admin_routes = Router::new()
        .route("/save-smtp-settings", post(save_smtp_settings))
        .route("/test-smtp", post(test_smtp));

    let api_routes = Router::new().merge(public_routes).merge(admin_routes);

    let jwt_state_for_middleware = jwt_state.clone();

    Router::new()
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(&cors_origins))
                .layer(middleware::from_fn(move |req, next| {
                    let state = jwt_state_for_middleware.clone();
                    jwt_auth(state, req, next)
                }))
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
