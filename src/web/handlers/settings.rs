//! SMTP settings administration handlers.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::mailer::MailSettings;
use crate::web::dto::{MessageResponse, SmtpSettingsRequest};
use crate::web::error::ApiError;
use crate::web::middleware::AuthUser;

use super::AppState;

/// POST /api/save-smtp-settings - Persist the SMTP settings document.
pub async fn save_smtp_settings(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Json(req): Json<SmtpSettingsRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let settings = MailSettings {
        smtp_server: required(req.smtp_server, "smtpServer")?,
        smtp_port: req
            .smtp_port
            .ok_or_else(|| ApiError::bad_request("Missing field: smtpPort"))?,
        smtp_user: required(req.smtp_user, "smtpUser")?,
        smtp_password: required(req.smtp_password, "smtpPassword")?,
        smtp_sender_email: required(req.smtp_sender_email, "smtpSenderEmail")?,
    };

    settings.save(state.mailer.settings_path())?;
    tracing::info!(
        "SMTP settings updated by {} (server {}:{})",
        claims.sub,
        settings.smtp_server,
        settings.smtp_port
    );

    Ok(Json(MessageResponse {
        message: "SMTP settings saved".to_string(),
    }))
}

/// POST /api/test-smtp - Send a test message with the saved settings.
///
/// 404 when no settings document exists, 500 when the send fails.
pub async fn test_smtp(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<MessageResponse>, ApiError> {
    tracing::info!("SMTP test requested by {}", claims.sub);

    let mailer = state.mailer.clone();
    tokio::task::spawn_blocking(move || mailer.send_test_message())
        .await
        .map_err(|e| {
            tracing::error!("SMTP test task failed: {}", e);
            ApiError::internal("An internal error occurred")
        })??;

    Ok(Json(MessageResponse {
        message: "Test message sent".to_string(),
    }))
}

fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::bad_request(format!("Missing field: {field}"))),
    }
}
