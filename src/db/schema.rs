//! Database schema and migrations for iTransfer.
//!
//! This module contains all database migrations that will be applied
//! sequentially when the database is first opened or upgraded.

/// Database migrations.
///
/// Each migration is a SQL script that will be executed in order.
/// The schema_version table tracks which migrations have been applied.
pub const MIGRATIONS: &[&str] = &[
    // v1: Initial schema - transfers table
    r#"
-- One row per upload batch. The id doubles as the download capability.
CREATE TABLE transfers (
    id              TEXT PRIMARY KEY,        -- UUID v4
    filename        TEXT NOT NULL,           -- final artifact name in the store root
    recipient_email TEXT NOT NULL,
    sender_email    TEXT NOT NULL,
    content_hash    TEXT NOT NULL,           -- SHA-256 hex of the final artifact
    downloaded      INTEGER NOT NULL DEFAULT 0,
    created_at      TEXT NOT NULL,
    expires_at      TEXT NOT NULL,
    manifest        TEXT NOT NULL            -- JSON array of {name, size}
);

CREATE INDEX idx_transfers_expires_at ON transfers(expires_at);
"#,
];
