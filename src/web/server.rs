//! Web server for iTransfer.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::config::Config;
use crate::db::Database;
use crate::mailer::Mailer;
use crate::store::ArtifactStore;
use crate::sweeper::{self, SweeperHandle};
use crate::{Result, TransferError};

use super::handlers::AppState;
use super::middleware::JwtState;
use super::router::{create_health_router, create_router};

/// Web server for the API.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// JWT state.
    jwt_state: Arc<JwtState>,
    /// Retention sweep interval.
    sweep_interval: Duration,
}

impl WebServer {
    /// Create a new web server.
    pub fn new(config: Config, db: Arc<Database>) -> Result<Self> {
        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|_| {
                TransferError::Config(format!(
                    "invalid server address {}:{}",
                    config.server.host, config.server.port
                ))
            })?;

        let store = ArtifactStore::new(&config.storage.root)?;
        let mailer = Mailer::new(&config.mail.settings_path, &config.mail.timezone);
        let jwt_state = Arc::new(JwtState::new(&config.auth.jwt_secret));
        let sweep_interval = Duration::from_secs(config.retention.sweep_interval_secs);

        let app_state = Arc::new(AppState::new(db, store, mailer, config));

        Ok(Self {
            addr,
            app_state,
            jwt_state,
            sweep_interval,
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Run the web server until the process exits.
    pub async fn run(self) -> Result<()> {
        let (listener, router, sweeper) = self.bind().await?;
        let result = axum::serve(listener, router).await;
        sweeper.shutdown().await;
        result?;
        Ok(())
    }

    /// Run the server in the background and return the bound address plus
    /// the sweeper handle for deterministic shutdown.
    ///
    /// Useful for tests binding to port 0.
    pub async fn run_with_addr(self) -> Result<(SocketAddr, SweeperHandle)> {
        let (listener, router, sweeper) = self.bind().await?;
        let local_addr = listener.local_addr()?;

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok((local_addr, sweeper))
    }

    async fn bind(self) -> Result<(TcpListener, axum::Router, SweeperHandle)> {
        let db = self.app_state.db.clone();
        let store = self.app_state.store.clone();

        let router = create_router(self.app_state, self.jwt_state).merge(create_health_router());

        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        // The sweeper starts only once the server actually bound
        let sweeper = sweeper::spawn(db, store, self.sweep_interval);

        tracing::info!("Web server listening on http://{}", local_addr);

        Ok((listener, router, sweeper))
    }
}
