//! Admin authentication handler.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::web::dto::{LoginRequest, LoginResponse};
use crate::web::error::ApiError;

use super::AppState;

/// POST /api/login - Admin login against the configured credentials.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    if req.username.is_empty() || req.password.is_empty() {
        return Err(ApiError::bad_request("Username and password are required"));
    }

    let admin = &state.config.admin;

    // An empty configured password keeps the admin surface locked
    if admin.password.is_empty() {
        tracing::warn!("Admin login rejected: no admin password configured");
        return Err(ApiError::unauthorized("Invalid username or password"));
    }

    if req.username != admin.username || req.password != admin.password {
        tracing::info!("Failed admin login attempt for {:?}", req.username);
        return Err(ApiError::unauthorized("Invalid username or password"));
    }

    let token = state.generate_token(&req.username)?;
    tracing::info!("Admin {} logged in", req.username);

    Ok(Json(LoginResponse { token }))
}
