//! iTransfer - self-hosted ephemeral file transfer service.
//!
//! A sender uploads a batch of files, the service packages them into a
//! single deliverable, emails the recipient a download link and the sender a
//! confirmation, notifies the sender on first download, and purges transfers
//! after their retention window.

pub mod config;
pub mod datetime;
pub mod db;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod mailer;
pub mod sizefmt;
pub mod store;
pub mod sweeper;
pub mod web;

pub use config::Config;
pub use db::Database;
pub use error::{Result, TransferError};
pub use mailer::Mailer;
pub use store::ArtifactStore;
pub use web::WebServer;
