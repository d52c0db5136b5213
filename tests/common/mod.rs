//! Test helpers for Web API integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum_test::TestServer;
use serde_json::{json, Value};
use tempfile::TempDir;

use itransfer::config::Config;
use itransfer::db::{Database, FileEntry, NewTransfer, TransferRecord, TransferRepository};
use itransfer::mailer::Mailer;
use itransfer::store::ArtifactStore;
use itransfer::web::handlers::AppState;
use itransfer::web::middleware::JwtState;
use itransfer::web::router::create_router;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "test-password";

/// A running test server with its backing state.
pub struct TestContext {
    pub server: TestServer,
    pub db: Arc<Database>,
    pub store: ArtifactStore,
    pub settings_path: std::path::PathBuf,
    // Held so the storage directory outlives the test
    _dir: TempDir,
}

/// Create a test configuration rooted in a temporary directory.
pub fn test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0;
    config.storage.root = dir.path().join("uploads").display().to_string();
    config.mail.settings_path = dir.path().join("smtp_config.json").display().to_string();
    config.admin.username = ADMIN_USERNAME.to_string();
    config.admin.password = ADMIN_PASSWORD.to_string();
    config.auth.jwt_secret = "test-secret-key-for-testing-only".to_string();
    config
}

/// Create a test server with an in-memory database and temp storage.
pub async fn create_test_server() -> TestContext {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = test_config(&dir);

    let db = Arc::new(
        Database::open_in_memory()
            .await
            .expect("Failed to create test database"),
    );
    let store = ArtifactStore::new(&config.storage.root).expect("Failed to create store");
    let settings_path = std::path::PathBuf::from(&config.mail.settings_path);
    let mailer = Mailer::new(&config.mail.settings_path, &config.mail.timezone);

    let jwt_state = Arc::new(JwtState::new(&config.auth.jwt_secret));
    let app_state = Arc::new(AppState::new(
        db.clone(),
        store.clone(),
        mailer,
        config,
    ));

    let router = create_router(app_state, jwt_state);
    let server = TestServer::new(router).expect("Failed to create test server");

    TestContext {
        server,
        db,
        store,
        settings_path,
        _dir: dir,
    }
}

/// Log in as the configured admin and return the session token.
pub async fn login_token(server: &TestServer) -> String {
    let response = server
        .post("/api/login")
        .json(&json!({
            "username": ADMIN_USERNAME,
            "password": ADMIN_PASSWORD,
        }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    body["token"].as_str().expect("No token in response").to_string()
}

/// Insert a transfer record with a backing artifact, bypassing the API.
pub async fn seed_transfer(
    ctx: &TestContext,
    id: &str,
    filename: &str,
    content: &[u8],
    expiration_days: i64,
) -> TransferRecord {
    let staged = ctx
        .store
        .stage(id, filename, content)
        .expect("Failed to stage artifact");
    ctx.store
        .finalize(&staged, filename)
        .expect("Failed to finalize artifact");
    ctx.store.remove_scratch(id);

    let repo = TransferRepository::new(ctx.db.pool());
    repo.create(&NewTransfer {
        id: id.to_string(),
        filename: filename.to_string(),
        recipient_email: "to@example.com".to_string(),
        sender_email: "from@example.com".to_string(),
        content_hash: "ee".repeat(32),
        expiration_days,
        manifest: vec![FileEntry {
            name: filename.to_string(),
            size: content.len() as u64,
        }],
    })
    .await
    .expect("Failed to insert transfer")
}

/// Move a transfer's expiry into the past.
pub async fn expire_transfer(ctx: &TestContext, id: &str) {
    sqlx::query("UPDATE transfers SET expires_at = ? WHERE id = ?")
        .bind(chrono::Utc::now() - chrono::Duration::days(1))
        .bind(id)
        .execute(ctx.db.pool())
        .await
        .expect("Failed to expire transfer");
}

/// Number of rows in the transfers table.
pub async fn transfer_count(ctx: &TestContext) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM transfers")
        .fetch_one(ctx.db.pool())
        .await
        .expect("Failed to count transfers")
}
