//! Web API handlers.

pub mod auth;
pub mod settings;
pub mod transfer;
pub mod upload;

pub use auth::login;
pub use settings::{save_smtp_settings, test_smtp};
pub use transfer::{download, transfer_details};
pub use upload::upload;

use jsonwebtoken::{encode, EncodingKey, Header};
use std::sync::Arc;

use crate::config::Config;
use crate::db::Database;
use crate::mailer::Mailer;
use crate::store::ArtifactStore;
use crate::web::error::ApiError;
use crate::web::middleware::JwtClaims;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database handle.
    pub db: Arc<Database>,
    /// Artifact store.
    pub store: ArtifactStore,
    /// Notification dispatcher.
    pub mailer: Mailer,
    /// Service configuration.
    pub config: Config,
    /// JWT encoding key, derived from the configured secret.
    pub encoding_key: EncodingKey,
}

impl AppState {
    /// Create a new application state.
    pub fn new(db: Arc<Database>, store: ArtifactStore, mailer: Mailer, config: Config) -> Self {
        let encoding_key = EncodingKey::from_secret(config.auth.jwt_secret.as_bytes());
        Self {
            db,
            store,
            mailer,
            config,
            encoding_key,
        }
    }

    /// Generate a session token for the admin user.
    pub fn generate_token(&self, username: &str) -> Result<String, ApiError> {
        let now = chrono::Utc::now().timestamp() as u64;
        let claims = JwtClaims {
            sub: username.to_string(),
            iat: now,
            exp: now + self.config.auth.token_expiry_secs,
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode JWT: {}", e);
            ApiError::internal("Failed to generate token")
        })
    }
}
