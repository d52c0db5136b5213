//! Multipart upload handler.

use axum::extract::{Multipart, State};
use axum::http::header::HOST;
use axum::http::HeaderMap;
use axum::Json;
use std::sync::Arc;

use crate::config::ServerConfig;
use crate::db::{normalize_expiration_days, FileEntry, NewTransfer, TransferRepository};
use crate::ingest::{self, UploadFile};
use crate::web::dto::UploadResponse;
use crate::web::error::ApiError;

use super::AppState;

/// Parsed multipart upload form.
#[derive(Debug, Default)]
struct UploadForm {
    files: Vec<UploadFile>,
    paths: Vec<String>,
    email: String,
    sender_email: String,
    expiration_days: Option<i64>,
    files_list: String,
}

/// POST /api/upload - Ingest an upload batch and create a transfer.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let form = parse_form(multipart).await?;

    if form.files.is_empty() {
        return Err(ApiError::bad_request("No files provided"));
    }
    if form.email.is_empty() {
        return Err(ApiError::bad_request("Recipient email is required"));
    }
    if form.sender_email.is_empty() {
        return Err(ApiError::bad_request("Sender email is required"));
    }

    let manifest: Vec<FileEntry> = serde_json::from_str(&form.files_list)
        .map_err(|_| ApiError::bad_request("Invalid files list"))?;
    if manifest.is_empty() {
        return Err(ApiError::bad_request("Invalid files list"));
    }

    let expiration_days = normalize_expiration_days(form.expiration_days);
    let transfer_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(
        "Ingesting {} file(s) as transfer {} ({} day retention)",
        form.files.len(),
        transfer_id,
        expiration_days
    );

    // Stage, package and hash on a blocking worker. The scratch directory is
    // removed whether packaging succeeded or not.
    let files = pair_files_with_paths(form.files, &form.paths);
    let store = state.store.clone();
    let id = transfer_id.clone();
    let packaged = tokio::task::spawn_blocking(move || {
        let result = ingest::stage_and_package(&store, &id, &files);
        store.remove_scratch(&id);
        result
    })
    .await
    .map_err(|e| {
        tracing::error!("Ingestion task failed: {}", e);
        ApiError::internal("An internal error occurred")
    })??;

    let repo = TransferRepository::new(state.db.pool());
    let record = match repo
        .create(&NewTransfer {
            id: transfer_id.clone(),
            filename: packaged.final_name.clone(),
            recipient_email: form.email,
            sender_email: form.sender_email,
            content_hash: packaged.content_hash,
            expiration_days,
            manifest,
        })
        .await
    {
        Ok(record) => record,
        Err(e) => {
            // Without a record the deliverable is unreachable and the
            // sweeper would never purge it; remove it before failing
            if let Err(del_err) = state.store.delete(&packaged.final_name) {
                tracing::warn!(
                    "Failed to remove artifact {} after insert failure: {}",
                    packaged.final_name,
                    del_err
                );
            }
            return Err(e.into());
        }
    };

    let download_link = format!(
        "{}/download/{}",
        link_base(&state.config.server, &headers),
        transfer_id
    );

    let mailer = state.mailer.clone();
    let mail_record = record.clone();
    let (recipient_ok, sender_ok) = tokio::task::spawn_blocking(move || {
        let recipient_ok = mailer.send_recipient_notification(&mail_record, &download_link);
        let sender_ok = mailer.send_sender_confirmation(&mail_record, &download_link);
        (recipient_ok, sender_ok)
    })
    .await
    .unwrap_or((false, false));

    let warning = match (recipient_ok, sender_ok) {
        (true, true) => None,
        (false, false) => Some("Could not send notification emails".to_string()),
        (false, true) => Some("Could not notify the recipient".to_string()),
        (true, false) => Some("Could not send the sender confirmation".to_string()),
    };

    Ok(Json(UploadResponse {
        success: true,
        file_id: record.id,
        message: "Files sent successfully".to_string(),
        warning,
    }))
}

/// Drain the multipart stream into an UploadForm.
async fn parse_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::debug!("Malformed multipart body: {}", e);
        ApiError::bad_request("Malformed multipart body")
    })? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "files[]" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let content = field
                    .bytes()
                    .await
                    .map_err(|_| ApiError::bad_request("Failed to read uploaded file"))?;
                form.files.push(UploadFile {
                    relative_path: filename,
                    content: content.to_vec(),
                });
            }
            "paths[]" => {
                let path = read_text(field).await?;
                form.paths.push(path);
            }
            "email" => form.email = read_text(field).await?,
            "sender_email" => form.sender_email = read_text(field).await?,
            "expiration_days" => {
                form.expiration_days = read_text(field).await?.trim().parse().ok();
            }
            "files_list" => form.files_list = read_text(field).await?,
            other => tracing::debug!("Ignoring unknown multipart field {:?}", other),
        }
    }

    Ok(form)
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|_| ApiError::bad_request("Failed to read form field"))
}

/// Pair each file with its declared relative path, by position.
///
/// Files beyond the declared paths keep the filename from their multipart
/// part.
fn pair_files_with_paths(files: Vec<UploadFile>, paths: &[String]) -> Vec<UploadFile> {
    files
        .into_iter()
        .enumerate()
        .map(|(i, file)| match paths.get(i) {
            Some(path) if !path.is_empty() => UploadFile {
                relative_path: path.clone(),
                content: file.content,
            },
            _ => file,
        })
        .collect()
}

/// Base URL for download links embedded in notification emails.
///
/// The configured frontend URL wins; otherwise the base is rebuilt from the
/// request Host header. X-Forwarded-Proto is only trusted when the service
/// is declared to sit behind a reverse proxy.
fn link_base(server: &ServerConfig, headers: &HeaderMap) -> String {
    if let Some(url) = &server.frontend_url {
        let url = url.trim_end_matches('/');
        if server.force_https {
            if let Some(rest) = url.strip_prefix("http://") {
                return format!("https://{rest}");
            }
        }
        return url.to_string();
    }

    let host = headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");

    let scheme = if server.force_https {
        "https"
    } else if server.proxy_hops > 0 {
        headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("http")
    } else {
        "http"
    };

    format!("{scheme}://{host}")
}
