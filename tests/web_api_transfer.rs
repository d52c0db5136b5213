//! Web API transfer access tests.
//!
//! Metadata lookup, download semantics and the 404/410 gates.

mod common;

use axum::http::header::CONTENT_DISPOSITION;
use serde_json::Value;

use itransfer::db::{Database, FileEntry, NewTransfer, TransferRepository};

use common::{create_test_server, expire_transfer, seed_transfer};

#[tokio::test]
async fn test_transfer_details() {
    let ctx = create_test_server().await;
    seed_transfer(&ctx, "t-1", "report.pdf", b"%PDF", 7).await;

    let response = ctx.server.get("/api/transfer/t-1").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["files"][0]["name"], "report.pdf");
    assert_eq!(body["files"][0]["size"], 4);
    assert!(body["expires_at"].is_string());
}

#[tokio::test]
async fn test_transfer_details_unknown_id() {
    let ctx = create_test_server().await;

    let response = ctx.server.get("/api/transfer/no-such-id").await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn test_download_streams_artifact() {
    let ctx = create_test_server().await;
    seed_transfer(&ctx, "t-2", "report.pdf", b"%PDF", 7).await;

    let response = ctx.server.get("/api/download/t-2").await;
    response.assert_status_ok();
    assert_eq!(response.as_bytes().to_vec(), b"%PDF".to_vec());

    let disposition = response
        .headers()
        .get(CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap();
    assert_eq!(disposition, "attachment; filename=\"report.pdf\"");
}

#[tokio::test]
async fn test_download_flips_flag_once() {
    let ctx = create_test_server().await;
    seed_transfer(&ctx, "t-3", "a.txt", b"data", 7).await;

    let repo = TransferRepository::new(ctx.db.pool());
    assert!(!repo.get_by_id("t-3").await.unwrap().unwrap().downloaded);

    ctx.server.get("/api/download/t-3").await.assert_status_ok();
    assert!(repo.get_by_id("t-3").await.unwrap().unwrap().downloaded);

    // A repeat download serves the same bytes and leaves the flag set
    let response = ctx.server.get("/api/download/t-3").await;
    response.assert_status_ok();
    assert_eq!(response.as_bytes().to_vec(), b"data".to_vec());
    assert!(repo.get_by_id("t-3").await.unwrap().unwrap().downloaded);
}

#[tokio::test]
async fn test_concurrent_first_downloads_single_winner() {
    // File-backed database so the tasks genuinely contend on SQLite
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}", dir.path().join("race.db").display());
    let db = std::sync::Arc::new(Database::open(&url).await.unwrap());

    let repo = TransferRepository::new(db.pool());
    repo.create(&NewTransfer {
        id: "race".to_string(),
        filename: "race.zip".to_string(),
        recipient_email: "to@example.com".to_string(),
        sender_email: "from@example.com".to_string(),
        content_hash: "ff".repeat(32),
        expiration_days: 7,
        manifest: vec![FileEntry {
            name: "race.zip".to_string(),
            size: 4,
        }],
    })
    .await
    .unwrap();

    let mut handles = Vec::new();
    for _ in 0..32 {
        let db = db.clone();
        handles.push(tokio::spawn(async move {
            let repo = TransferRepository::new(db.pool());
            repo.mark_downloaded("race").await.unwrap()
        }));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }

    // The conditional UPDATE lets exactly one request claim the flip
    assert_eq!(winners, 1);
    assert!(repo.get_by_id("race").await.unwrap().unwrap().downloaded);
}

#[tokio::test]
async fn test_expired_transfer_gone() {
    let ctx = create_test_server().await;
    seed_transfer(&ctx, "t-4", "a.txt", b"data", 3).await;
    expire_transfer(&ctx, "t-4").await;

    // Expiry is checked on access even though the sweeper has not run
    let response = ctx.server.get("/api/transfer/t-4").await;
    response.assert_status(axum::http::StatusCode::GONE);

    let response = ctx.server.get("/api/download/t-4").await;
    response.assert_status(axum::http::StatusCode::GONE);

    // The record and artifact are still there, only unservable
    let repo = TransferRepository::new(ctx.db.pool());
    assert!(repo.get_by_id("t-4").await.unwrap().is_some());
    assert!(ctx.store.exists("a.txt"));
}

#[tokio::test]
async fn test_missing_artifact_not_found() {
    let ctx = create_test_server().await;
    seed_transfer(&ctx, "t-5", "gone.zip", b"bytes", 7).await;
    ctx.store.delete("gone.zip").unwrap();

    let response = ctx.server.get("/api/transfer/t-5").await;
    response.assert_status_not_found();

    let response = ctx.server.get("/api/download/t-5").await;
    response.assert_status_not_found();

    // The missing artifact never counts as a download
    let repo = TransferRepository::new(ctx.db.pool());
    assert!(!repo.get_by_id("t-5").await.unwrap().unwrap().downloaded);
}
