//! Transfer metadata and download handlers.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Response};
use axum::Json;
use std::sync::Arc;

use crate::db::{TransferRecord, TransferRepository};
use crate::web::dto::TransferDetailsResponse;
use crate::web::error::ApiError;

use super::AppState;

/// GET /api/transfer/:id - Metadata for the download page.
pub async fn transfer_details(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TransferDetailsResponse>, ApiError> {
    let record = load_servable(&state, &id).await?;

    Ok(Json(TransferDetailsResponse {
        files: record.manifest,
        expires_at: record.expires_at,
    }))
}

/// GET /api/download/:id - Stream the artifact as an attachment.
///
/// The first download to win the conditional flag update notifies the
/// sender; repeat downloads serve the same bytes silently.
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response<Body>, ApiError> {
    let record = load_servable(&state, &id).await?;

    let store = state.store.clone();
    let filename = record.filename.clone();
    let content = tokio::task::spawn_blocking(move || store.load(&filename))
        .await
        .map_err(|e| {
            tracing::error!("Artifact read task failed: {}", e);
            ApiError::internal("An internal error occurred")
        })??;

    let repo = TransferRepository::new(state.db.pool());
    if repo.mark_downloaded(&id).await? {
        tracing::info!("Transfer {} downloaded for the first time", id);
        let mailer = state.mailer.clone();
        let mail_record = record.clone();
        // Fire and forget; the dispatcher logs its own failures
        tokio::task::spawn_blocking(move || {
            mailer.send_download_notification(&mail_record);
        });
    }

    let content_type = mime_guess::from_path(&record.filename)
        .first_or_octet_stream()
        .to_string();

    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(&record.filename),
        )
        .header(header::CONTENT_LENGTH, content.len())
        .body(Body::from(content))
        .map_err(|e| {
            tracing::error!("Failed to build download response: {}", e);
            ApiError::internal("An internal error occurred")
        })
}

/// Fetch a record and apply the servability gates shared by both endpoints:
/// unknown id or missing artifact is 404, elapsed retention is 410.
async fn load_servable(state: &AppState, id: &str) -> Result<TransferRecord, ApiError> {
    let repo = TransferRepository::new(state.db.pool());
    let record = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Transfer not found"))?;

    if record.is_expired(chrono::Utc::now()) {
        return Err(ApiError::gone("This transfer has expired"));
    }

    if !state.store.exists(&record.filename) {
        tracing::warn!(
            "Transfer {} has no backing artifact {}",
            record.id,
            record.filename
        );
        return Err(ApiError::not_found("Transfer not found"));
    }

    Ok(record)
}

/// Generate a safe Content-Disposition header value for downloads.
///
/// Control characters are stripped so a filename can never inject headers;
/// quotes and backslashes are replaced in the ASCII fallback; non-ASCII
/// names get an RFC 5987 `filename*` parameter.
fn content_disposition_header(filename: &str) -> String {
    let sanitized: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' | '\\' => '_',
            _ => c,
        })
        .collect();

    if filename.is_ascii() && !filename.chars().any(|c| c.is_control() || c == '"' || c == '\\') {
        return format!("attachment; filename=\"{filename}\"");
    }

    let encoded = urlencoding::encode(filename);
    format!("attachment; filename=\"{sanitized}\"; filename*=UTF-8''{encoded}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_simple_ascii() {
        let result = content_disposition_header("iTransfer_2406011200.zip");
        assert_eq!(
            result,
            "attachment; filename=\"iTransfer_2406011200.zip\""
        );
    }

    #[test]
    fn test_content_disposition_non_ascii() {
        let result = content_disposition_header("résumé.pdf");
        assert!(result.starts_with("attachment; filename=\""));
        assert!(result.contains("filename*=UTF-8''"));
        assert!(result.contains("r%C3%A9sum%C3%A9.pdf"));
    }

    #[test]
    fn test_content_disposition_strips_control_characters() {
        let result = content_disposition_header("evil\r\nX-Injected: yes.txt");
        assert!(!result.contains('\r'));
        assert!(!result.contains('\n'));
        assert!(result.starts_with("attachment; filename="));
    }

    #[test]
    fn test_content_disposition_escapes_quotes() {
        let result = content_disposition_header("a\"b.txt");
        assert!(result.contains("filename=\"a_b.txt\""));
        assert!(result.contains("filename*=UTF-8''"));
    }
}
