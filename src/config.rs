//! Configuration module for iTransfer.

use serde::Deserialize;
use std::path::Path;

use crate::{Result, TransferError};

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origins. Empty means permissive (development) mode.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Force https when building download links.
    #[serde(default)]
    pub force_https: bool,
    /// Number of reverse proxies in front of the service. When greater than
    /// zero the X-Forwarded-Proto header is trusted for the request scheme.
    #[serde(default = "default_proxy_hops")]
    pub proxy_hops: u32,
    /// Base URL of the download frontend, embedded in notification emails.
    /// When unset the link base is derived from the incoming request.
    #[serde(default)]
    pub frontend_url: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5500
}

fn default_proxy_hops() -> u32 {
    1
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            force_https: false,
            proxy_hops: default_proxy_hops(),
            frontend_url: None,
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// sqlx connection URL for the SQLite database.
    #[serde(default = "default_db_url")]
    pub url: String,
    /// Bounded number of connection attempts at startup.
    #[serde(default = "default_connect_attempts")]
    pub connect_attempts: u32,
}

fn default_db_url() -> String {
    "sqlite:data/itransfer.db".to_string()
}

fn default_connect_attempts() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_db_url(),
            connect_attempts: default_connect_attempts(),
        }
    }
}

/// Artifact storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Root directory for finalized artifacts. A `temp/` scratch area for
    /// in-progress uploads lives underneath it.
    #[serde(default = "default_storage_root")]
    pub root: String,
    /// Maximum upload size in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
}

fn default_storage_root() -> String {
    "data/uploads".to_string()
}

fn default_max_upload_size() -> u64 {
    51200
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            max_upload_size_mb: default_max_upload_size(),
        }
    }
}

/// Admin credentials for the settings UI.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    /// Admin username.
    #[serde(default = "default_admin_username")]
    pub username: String,
    /// Admin password.
    #[serde(default)]
    pub password: String,
}

fn default_admin_username() -> String {
    "admin".to_string()
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: default_admin_username(),
            password: String::new(),
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Secret used to sign admin session tokens.
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Token expiry in seconds.
    #[serde(default = "default_token_expiry")]
    pub token_expiry_secs: u64,
}

fn default_jwt_secret() -> String {
    "change-me".to_string()
}

fn default_token_expiry() -> u64 {
    3600
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            token_expiry_secs: default_token_expiry(),
        }
    }
}

/// Mail configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    /// Path of the durable SMTP settings document (JSON). The dispatcher
    /// reads it before every send so saved changes apply immediately.
    #[serde(default = "default_mail_settings_path")]
    pub settings_path: String,
    /// Time zone used when rendering dates in emails (e.g. "Europe/Paris").
    #[serde(default = "default_mail_timezone")]
    pub timezone: String,
}

fn default_mail_settings_path() -> String {
    "data/smtp_config.json".to_string()
}

fn default_mail_timezone() -> String {
    "Europe/Paris".to_string()
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            settings_path: default_mail_settings_path(),
            timezone: default_mail_timezone(),
        }
    }
}

/// Retention configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RetentionConfig {
    /// Sweep interval in seconds. Cadence is operational, not a correctness
    /// property; expiry is also enforced at read time.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

fn default_sweep_interval() -> u64 {
    12 * 3600
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/itransfer.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Artifact storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Admin credentials.
    #[serde(default)]
    pub admin: AdminConfig,
    /// Authentication configuration.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Mail configuration.
    #[serde(default)]
    pub mail: MailConfig,
    /// Retention configuration.
    #[serde(default)]
    pub retention: RetentionConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| TransferError::Config(e.to_string()))
    }
}
