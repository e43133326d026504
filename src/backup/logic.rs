// mongobackup/src/backup/logic.rs
use std::sync::Arc;

use super::archive::BackupArchive;
use super::db_dump::{ArchiveProducer, ConnectionTarget};
use crate::errors::{BackupError, GatewayError};
use crate::storage::ObjectStore;
use crate::utils::clock::Clock;

/// Result of one backup invocation. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupOutcome {
    Created { key: String, size_bytes: u64 },
    AlreadyExists { key: String },
    Failed(BackupError),
}

/// Decides whether today's archive is needed, produces it and pushes it to the store.
pub struct BackupOrchestrator {
    producer: Arc<dyn ArchiveProducer>,
    store: Arc<dyn ObjectStore>,
    clock: Arc<dyn Clock>,
    target: ConnectionTarget,
}

impl BackupOrchestrator {
    pub fn new(
        producer: Arc<dyn ArchiveProducer>,
        store: Arc<dyn ObjectStore>,
        clock: Arc<dyn Clock>,
        target: ConnectionTarget,
    ) -> Self {
        BackupOrchestrator {
            producer,
            store,
            clock,
            target,
        }
    }

    /// Runs the daily backup at most once per UTC day.
    ///
    /// There is no retry here; callers decide when to try again.
    pub async fn run_daily_backup(&self) -> BackupOutcome {
        let archive = BackupArchive::for_instant(self.clock.now());
        let key = archive.key;
        tracing::info!(key = %key, created_at = %archive.created_at, "Starting Mongo backup process");

        match self.store.exists(&key).await {
            Ok(true) => {
                tracing::info!(key = %key, "Backup already found for today, all good!");
                return BackupOutcome::AlreadyExists { key };
            }
            Ok(false) => {
                tracing::info!(key = %key, "Backup not found for today, trying to backup");
            }
            Err(e) => {
                return BackupOutcome::Failed(BackupError::GatewayUnavailable(gateway_message(e)));
            }
        }

        tracing::info!(key = %key, target = %self.target, "Creating dump");
        let payload = match self.producer.produce(&self.target).await {
            Ok(payload) => payload,
            Err(e) => return BackupOutcome::Failed(e.into()),
        };
        let size_bytes = payload.len().await.unwrap_or_default();

        tracing::info!(key = %key, size_bytes, "Uploading archive");
        let upload = self.store.put(&key, &payload).await;

        // the local copy goes whether or not the upload went through
        if let Err(e) = self.producer.discard(payload).await {
            tracing::warn!(key = %key, error = %e, "Failed to delete local archive");
        }

        match upload {
            Ok(()) => {
                tracing::info!(key = %key, size_bytes, "Mongo dump successfully created!");
                BackupOutcome::Created { key, size_bytes }
            }
            Err(GatewayError::AlreadyExists(_)) => {
                tracing::info!(key = %key, "Archive appeared concurrently, keeping the stored copy");
                BackupOutcome::AlreadyExists { key }
            }
            Err(e) => BackupOutcome::Failed(BackupError::UploadFailed(gateway_message(e))),
        }
    }
}

fn gateway_message(err: GatewayError) -> String {
    match err {
        GatewayError::Unavailable(msg)
        | GatewayError::UploadFailed(msg)
        | GatewayError::AlreadyExists(msg)
        | GatewayError::NotFound(msg) => msg,
    }
}
