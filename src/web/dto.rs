//! Request and response DTOs for the Web API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::FileEntry;

/// Response to a successful upload.
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Always true on the success path.
    pub success: bool,
    /// Identifier of the created transfer.
    pub file_id: String,
    /// Human-readable status message.
    pub message: String,
    /// Present when the upload succeeded but a notification could not be sent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Response to a transfer metadata lookup.
#[derive(Debug, Serialize, Deserialize)]
pub struct TransferDetailsResponse {
    /// Client-declared manifest of the original files.
    pub files: Vec<FileEntry>,
    /// Expiry timestamp (UTC).
    pub expires_at: DateTime<Utc>,
}

/// Admin login request.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Admin username.
    pub username: String,
    /// Admin password.
    pub password: String,
}

/// Admin login response.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Signed session token.
    pub token: String,
}

/// SMTP settings update request. Field names mirror the admin frontend.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmtpSettingsRequest {
    /// SMTP server hostname.
    pub smtp_server: Option<String>,
    /// SMTP server port.
    pub smtp_port: Option<u16>,
    /// SMTP username.
    pub smtp_user: Option<String>,
    /// SMTP password.
    pub smtp_password: Option<String>,
    /// Sender address for outgoing mail.
    pub smtp_sender_email: Option<String>,
}

/// Generic message response.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Human-readable status message.
    pub message: String,
}
