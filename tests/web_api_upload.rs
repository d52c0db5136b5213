//! Web API upload tests.
//!
//! End-to-end coverage of the multipart ingestion endpoint.

mod common;

use axum_test::multipart::{MultipartForm, Part};
use serde_json::Value;
use sha2::{Digest, Sha256};

use itransfer::db::TransferRepository;

use common::{create_test_server, transfer_count};

fn file_part(content: &[u8], filename: &str) -> Part {
    Part::bytes(content.to_vec())
        .file_name(filename.to_string())
        .mime_type("application/octet-stream")
}

fn base_form() -> MultipartForm {
    MultipartForm::new()
        .add_text("email", "to@example.com")
        .add_text("sender_email", "from@example.com")
}

#[tokio::test]
async fn test_upload_two_files_creates_archive() {
    let ctx = create_test_server().await;

    let form = base_form()
        .add_text("expiration_days", "5")
        .add_text(
            "files_list",
            r#"[{"name":"a.txt","size":10},{"name":"notes/b.txt","size":20}]"#,
        )
        .add_part("files[]", file_part(b"0123456789", "a.txt"))
        .add_text("paths[]", "a.txt")
        .add_part("files[]", file_part(&[0x42; 20], "b.txt"))
        .add_text("paths[]", "notes/b.txt");

    let response = ctx.server.post("/api/upload").multipart(form).await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["success"], true);
    let file_id = body["file_id"].as_str().unwrap();

    let repo = TransferRepository::new(ctx.db.pool());
    let record = repo.get_by_id(file_id).await.unwrap().unwrap();

    // Two files: packaged as a dated zip
    assert!(record.filename.starts_with("iTransfer_"));
    assert!(record.filename.ends_with(".zip"));
    assert!(ctx.store.exists(&record.filename));

    assert_eq!(record.manifest.len(), 2);
    assert_eq!(record.manifest[1].name, "notes/b.txt");
    assert_eq!(record.total_size(), 30);
    assert_eq!(
        record.expires_at - record.created_at,
        chrono::Duration::days(5)
    );

    // Recorded hash covers the artifact exactly as stored
    let on_disk = ctx.store.load(&record.filename).unwrap();
    assert_eq!(record.content_hash, hex::encode(Sha256::digest(&on_disk)));
}

#[tokio::test]
async fn test_upload_single_file_stored_as_is() {
    let ctx = create_test_server().await;

    let form = base_form()
        .add_text("files_list", r#"[{"name":"report.pdf","size":4}]"#)
        .add_part("files[]", file_part(b"%PDF", "report.pdf"))
        .add_text("paths[]", "report.pdf");

    let response = ctx.server.post("/api/upload").multipart(form).await;
    response.assert_status_ok();

    let body: Value = response.json();
    let file_id = body["file_id"].as_str().unwrap();

    let repo = TransferRepository::new(ctx.db.pool());
    let record = repo.get_by_id(file_id).await.unwrap().unwrap();

    // A lone folderless file is the deliverable itself
    assert_eq!(record.filename, "report.pdf");
    assert_eq!(ctx.store.load("report.pdf").unwrap(), b"%PDF");
}

#[tokio::test]
async fn test_upload_reports_mail_warning_when_smtp_unconfigured() {
    let ctx = create_test_server().await;

    let form = base_form()
        .add_text("files_list", r#"[{"name":"a.txt","size":2}]"#)
        .add_part("files[]", file_part(b"ab", "a.txt"))
        .add_text("paths[]", "a.txt");

    let response = ctx.server.post("/api/upload").multipart(form).await;
    response.assert_status_ok();

    // The upload succeeds; failed notifications only surface as a warning
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert!(body["warning"].is_string());
}

#[tokio::test]
async fn test_upload_no_files_rejected() {
    let ctx = create_test_server().await;

    let form = base_form().add_text("files_list", r#"[{"name":"a.txt","size":2}]"#);

    let response = ctx.server.post("/api/upload").multipart(form).await;
    response.assert_status_bad_request();

    // No record, no artifact
    assert_eq!(transfer_count(&ctx).await, 0);
}

#[tokio::test]
async fn test_upload_missing_recipient_rejected() {
    let ctx = create_test_server().await;

    let form = MultipartForm::new()
        .add_text("sender_email", "from@example.com")
        .add_text("files_list", r#"[{"name":"a.txt","size":2}]"#)
        .add_part("files[]", file_part(b"ab", "a.txt"))
        .add_text("paths[]", "a.txt");

    let response = ctx.server.post("/api/upload").multipart(form).await;
    response.assert_status_bad_request();
    assert_eq!(transfer_count(&ctx).await, 0);
}

#[tokio::test]
async fn test_upload_invalid_files_list_rejected() {
    let ctx = create_test_server().await;

    let form = base_form()
        .add_text("files_list", "not json")
        .add_part("files[]", file_part(b"ab", "a.txt"))
        .add_text("paths[]", "a.txt");

    let response = ctx.server.post("/api/upload").multipart(form).await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_upload_out_of_range_expiration_coerced() {
    let ctx = create_test_server().await;

    let form = base_form()
        .add_text("expiration_days", "42")
        .add_text("files_list", r#"[{"name":"a.txt","size":2}]"#)
        .add_part("files[]", file_part(b"ab", "a.txt"))
        .add_text("paths[]", "a.txt");

    let response = ctx.server.post("/api/upload").multipart(form).await;
    response.assert_status_ok();

    let body: Value = response.json();
    let file_id = body["file_id"].as_str().unwrap();

    let repo = TransferRepository::new(ctx.db.pool());
    let record = repo.get_by_id(file_id).await.unwrap().unwrap();
    assert_eq!(
        record.expires_at - record.created_at,
        chrono::Duration::days(7)
    );
}

#[tokio::test]
async fn test_upload_insert_failure_leaves_no_artifact() {
    let ctx = create_test_server().await;

    // A closed pool makes the record insert fail after packaging succeeded
    ctx.db.pool().close().await;

    let form = base_form()
        .add_text("files_list", r#"[{"name":"a.txt","size":2}]"#)
        .add_part("files[]", file_part(b"ab", "a.txt"))
        .add_text("paths[]", "a.txt");

    let response = ctx.server.post("/api/upload").multipart(form).await;
    response.assert_status(axum::http::StatusCode::INTERNAL_SERVER_ERROR);

    // The finalized deliverable must not be left orphaned in the store root
    assert!(!ctx.store.exists("a.txt"));
    let entries: Vec<_> = std::fs::read_dir(ctx.store.root())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .filter(|name| name != "temp")
        .collect();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn test_upload_leaves_no_scratch_residue() {
    let ctx = create_test_server().await;

    let form = base_form()
        .add_text("files_list", r#"[{"name":"a.txt","size":2}]"#)
        .add_part("files[]", file_part(b"ab", "a.txt"))
        .add_text("paths[]", "a.txt");

    let response = ctx.server.post("/api/upload").multipart(form).await;
    response.assert_status_ok();

    let temp_dir = ctx.store.root().join("temp");
    let entries: Vec<_> = std::fs::read_dir(temp_dir).unwrap().collect();
    assert!(entries.is_empty());
}
