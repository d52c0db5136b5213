//! Error types for iTransfer.

use thiserror::Error;

/// Common error type for iTransfer.
#[derive(Error, Debug)]
pub enum TransferError {
    /// Database error.
    ///
    /// This is a generic database error that wraps errors from the
    /// persistence backend. Errors from sqlx are automatically converted.
    #[error("database error: {0}")]
    Database(String),

    /// Database connection error.
    #[error("database connection error: {0}")]
    DatabaseConnection(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Archive packaging error.
    #[error("archive error: {0}")]
    Archive(String),

    /// Validation error for client input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Transfer link has expired.
    #[error("transfer expired")]
    Expired,

    /// Mail transport error.
    #[error("mail error: {0}")]
    Mail(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

// Conversion from sqlx errors
impl From<sqlx::Error> for TransferError {
    fn from(e: sqlx::Error) -> Self {
        TransferError::Database(e.to_string())
    }
}

impl From<zip::result::ZipError> for TransferError {
    fn from(e: zip::result::ZipError) -> Self {
        TransferError::Archive(e.to_string())
    }
}

/// Result type alias for iTransfer operations.
pub type Result<T> = std::result::Result<T, TransferError>;
