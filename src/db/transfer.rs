//! Transfer record repository.
//!
//! CRUD operations for the `transfers` table. The manifest column holds a
//! JSON array of `{name, size}` pairs; serialization happens only at this
//! storage boundary.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

use crate::{Result, TransferError};

/// Allowed retention windows in days.
pub const ALLOWED_EXPIRATION_DAYS: [i64; 4] = [3, 5, 7, 10];

/// Retention window applied when the requested value is absent or invalid.
pub const DEFAULT_EXPIRATION_DAYS: i64 = 7;

/// One original uploaded file, as declared by the client.
///
/// Used for display and email summaries independent of whether the final
/// artifact is a single file or an archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Relative file name (may include one folder level).
    pub name: String,
    /// Size in bytes.
    pub size: u64,
}

/// Data required to insert a new transfer record.
#[derive(Debug, Clone)]
pub struct NewTransfer {
    /// Transfer identifier (UUID v4), generated at ingestion.
    pub id: String,
    /// Final artifact name under the store root.
    pub filename: String,
    /// Recipient email address.
    pub recipient_email: String,
    /// Sender email address.
    pub sender_email: String,
    /// SHA-256 hex digest of the final artifact bytes.
    pub content_hash: String,
    /// Retention window in days (already normalized).
    pub expiration_days: i64,
    /// Client-declared manifest of the original files.
    pub manifest: Vec<FileEntry>,
}

/// A persisted transfer.
#[derive(Debug, Clone)]
pub struct TransferRecord {
    /// Transfer identifier, the sole access capability.
    pub id: String,
    /// Final artifact name under the store root.
    pub filename: String,
    /// Recipient email address.
    pub recipient_email: String,
    /// Sender email address.
    pub sender_email: String,
    /// SHA-256 hex digest of the final artifact bytes.
    pub content_hash: String,
    /// Whether the artifact has been downloaded at least once.
    pub downloaded: bool,
    /// Insertion timestamp (UTC).
    pub created_at: DateTime<Utc>,
    /// Expiry timestamp (UTC), always after `created_at`.
    pub expires_at: DateTime<Utc>,
    /// Client-declared manifest of the original files.
    pub manifest: Vec<FileEntry>,
}

impl TransferRecord {
    /// Whether the transfer is past its expiry at the given instant.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Total size of the manifest in bytes.
    pub fn total_size(&self) -> u64 {
        self.manifest.iter().map(|f| f.size).sum()
    }
}

/// Normalize a requested expiration-days value to the allowed set.
///
/// Values outside {3, 5, 7, 10} (including absent ones) are silently
/// coerced to 7.
pub fn normalize_expiration_days(requested: Option<i64>) -> i64 {
    match requested {
        Some(days) if ALLOWED_EXPIRATION_DAYS.contains(&days) => days,
        _ => DEFAULT_EXPIRATION_DAYS,
    }
}

/// Repository for transfer record operations.
pub struct TransferRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> TransferRepository<'a> {
    /// Create a new TransferRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new transfer record.
    ///
    /// `created_at` is taken at insertion time and `expires_at` is derived
    /// from it, so `expires_at > created_at` holds by construction.
    pub async fn create(&self, new: &NewTransfer) -> Result<TransferRecord> {
        let created_at = Utc::now();
        let expires_at = created_at + Duration::days(new.expiration_days);
        let manifest_json = serde_json::to_string(&new.manifest)
            .map_err(|e| TransferError::Database(e.to_string()))?;

        sqlx::query(
            "INSERT INTO transfers
                (id, filename, recipient_email, sender_email, content_hash,
                 downloaded, created_at, expires_at, manifest)
             VALUES (?, ?, ?, ?, ?, 0, ?, ?, ?)",
        )
        .bind(&new.id)
        .bind(&new.filename)
        .bind(&new.recipient_email)
        .bind(&new.sender_email)
        .bind(&new.content_hash)
        .bind(created_at)
        .bind(expires_at)
        .bind(&manifest_json)
        .execute(self.pool)
        .await?;

        self.get_by_id(&new.id)
            .await?
            .ok_or_else(|| TransferError::NotFound("transfer".to_string()))
    }

    /// Get a transfer by its identifier.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<TransferRecord>> {
        let row = sqlx::query(
            "SELECT id, filename, recipient_email, sender_email, content_hash,
                    downloaded, created_at, expires_at, manifest
             FROM transfers WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Self::from_row).transpose()
    }

    /// Atomically flip the `downloaded` flag from false to true.
    ///
    /// Returns true only for the request that performed the transition, so
    /// concurrent first downloads trigger at most one notification.
    pub async fn mark_downloaded(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE transfers SET downloaded = 1 WHERE id = ? AND downloaded = 0")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// List all transfers whose expiry is in the past.
    pub async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<TransferRecord>> {
        let rows = sqlx::query(
            "SELECT id, filename, recipient_email, sender_email, content_hash,
                    downloaded, created_at, expires_at, manifest
             FROM transfers WHERE expires_at < ?",
        )
        .bind(now)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Self::from_row).collect()
    }

    /// Delete a transfer record. Returns true if a row was removed.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM transfers WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    fn from_row(row: sqlx::sqlite::SqliteRow) -> Result<TransferRecord> {
        let manifest_json: String = row.try_get("manifest")?;
        let manifest: Vec<FileEntry> = serde_json::from_str(&manifest_json)
            .map_err(|e| TransferError::Database(format!("corrupt manifest: {e}")))?;

        Ok(TransferRecord {
            id: row.try_get("id")?,
            filename: row.try_get("filename")?,
            recipient_email: row.try_get("recipient_email")?,
            sender_email: row.try_get("sender_email")?,
            content_hash: row.try_get("content_hash")?,
            downloaded: row.try_get("downloaded")?,
            created_at: row.try_get("created_at")?,
            expires_at: row.try_get("expires_at")?,
            manifest,
        })
    }
}
