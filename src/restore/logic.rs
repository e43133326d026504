// mongobackup/src/restore/logic.rs
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::PathBuf;

use super::db_restore::run_mongorestore;
use super::verification::verify_archive;
use crate::backup::archive::archive_key;
use crate::backup::db_dump::ConnectionTarget;
use crate::config::BackupSettings;
use crate::storage::ObjectStore;

/// Which day to restore and where to.
#[derive(Debug, Clone)]
pub struct RestoreRequest {
    pub date: NaiveDate,
    pub target: ConnectionTarget,
    pub drop: bool,
}

/// Downloads the archive for `request.date`, verifies it and feeds it to `mongorestore`.
///
/// The downloaded copy lives in a temp file under the work directory and is
/// removed whether or not the restore succeeds. Returns the restored key.
pub async fn perform_restore(
    store: &dyn ObjectStore,
    settings: &BackupSettings,
    request: &RestoreRequest,
) -> Result<String> {
    let key = archive_key(request.date);
    tracing::info!(key = %key, target = %request.target, "Starting restore");

    let payload = store
        .get(&key)
        .await
        .with_context(|| format!("Failed to fetch archive {}", key))?;
    let bytes = payload
        .read_all()
        .await
        .with_context(|| format!("Failed to read archive {}", key))?;

    tokio::fs::create_dir_all(&settings.work_dir)
        .await
        .with_context(|| format!("Failed to create work dir {}", settings.work_dir.display()))?;
    let download = tempfile::Builder::new()
        .prefix("mongodb-restore-")
        .suffix(".gzip")
        .tempfile_in(&settings.work_dir)
        .context("Failed to create temporary archive file")?;
    tokio::fs::write(download.path(), &bytes)
        .await
        .context("Failed to write downloaded archive")?;
    tracing::info!(key = %key, size_bytes = bytes.len(), path = %download.path().display(), "Archive downloaded");

    let path: PathBuf = download.path().to_path_buf();
    let decompressed = tokio::task::spawn_blocking(move || verify_archive(&path))
        .await
        .context("Archive verification task failed")??;
    tracing::info!(key = %key, decompressed_bytes = decompressed, "✓ Archive verified");

    run_mongorestore(
        settings.mongorestore_path.as_deref(),
        download.path(),
        &request.target,
        request.drop,
    )
    .await?;

    // dropping the handle deletes the temp file on every return path above too
    drop(download);
    tracing::info!(key = %key, "Restore completed");
    Ok(key)
}
