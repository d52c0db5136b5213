//! Retention sweeper.
//!
//! Periodically removes transfers whose expiry is in the past, deleting the
//! artifact before the record. Expiry is also enforced at read time, so the
//! sweep cadence only bounds how long expired data lingers on disk.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::db::{Database, TransferRepository};
use crate::store::ArtifactStore;
use crate::Result;

/// Handle to the background sweep task, used for deterministic shutdown.
pub struct SweeperHandle {
    token: CancellationToken,
    task: tokio::task::JoinHandle<()>,
}

impl SweeperHandle {
    /// Signal the sweeper to stop and wait for the current pass to finish.
    pub async fn shutdown(self) {
        self.token.cancel();
        if let Err(e) = self.task.await {
            error!("Sweeper task panicked: {}", e);
        }
    }
}

/// Spawn the periodic sweep task.
///
/// The first pass runs after one full interval; startup itself does not
/// sweep. Failures of individual passes are logged and the loop keeps going.
pub fn spawn(db: Arc<Database>, store: ArtifactStore, interval: Duration) -> SweeperHandle {
    let token = CancellationToken::new();
    let task_token = token.clone();

    let task = tokio::spawn(async move {
        info!("Retention sweeper started (interval {:?})", interval);
        let mut ticker = tokio::time::interval(interval);
        // The immediate first tick would sweep at startup
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match sweep_once(&db, &store).await {
                        Ok(0) => debug!("Retention sweep found nothing to remove"),
                        Ok(n) => info!("Retention sweep removed {} expired transfer(s)", n),
                        Err(e) => error!("Retention sweep failed: {}", e),
                    }
                }
                _ = task_token.cancelled() => {
                    info!("Retention sweeper stopping");
                    break;
                }
            }
        }
    });

    SweeperHandle { token, task }
}

/// Run a single sweep pass, returning how many transfers were removed.
///
/// The artifact is deleted before the record so a failure can never leave a
/// record pointing at freed storage without also keeping the record for the
/// next pass. Per-transfer failures are logged and do not stop the pass.
pub async fn sweep_once(db: &Database, store: &ArtifactStore) -> Result<usize> {
    let repo = TransferRepository::new(db.pool());
    let expired = repo.list_expired(Utc::now()).await?;

    let mut removed = 0;
    for record in expired {
        if let Err(e) = store.delete(&record.filename) {
            error!(
                "Failed to delete artifact {} for expired transfer {}: {}",
                record.filename, record.id, e
            );
            continue;
        }
        match repo.delete(&record.id).await {
            Ok(_) => {
                info!("Removed expired transfer {} ({})", record.id, record.filename);
                removed += 1;
            }
            Err(e) => {
                error!("Failed to delete expired transfer {}: {}", record.id, e);
            }
        }
    }

    Ok(removed)
}
