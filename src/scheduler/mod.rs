//! Time-based trigger for the daily backup.

pub(crate) mod cron;

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::backup::{BackupOrchestrator, BackupOutcome};
use crate::utils::clock::Clock;

pub use cron::WeeklySchedule;

/// Fires the orchestrator on every occurrence of `schedule` until `shutdown` is cancelled.
///
/// Failures are logged and swallowed; the next occurrence runs regardless.
/// A backup already in progress is not interrupted by cancellation.
pub async fn run_schedule(
    orchestrator: Arc<BackupOrchestrator>,
    schedule: WeeklySchedule,
    clock: Arc<dyn Clock>,
    shutdown: CancellationToken,
) {
    tracing::info!(schedule = %schedule, "Backup scheduler started");
    let mut next = schedule.next_after(clock.now());

    loop {
        let wait = (next - clock.now()).to_std().unwrap_or(Duration::ZERO);
        tracing::info!(next_run = %next, "Next scheduled backup");

        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!("Backup scheduler stopped");
                return;
            }
            _ = tokio::time::sleep(wait) => {}
        }

        let outcome = orchestrator.run_daily_backup().await;
        report(&outcome);

        // never schedule at or before the slot that just ran
        next = schedule.next_after(clock.now().max(next));
    }
}

fn report(outcome: &BackupOutcome) {
    match outcome {
        BackupOutcome::Created { key, size_bytes } => {
            tracing::info!(key = %key, size_bytes, "Scheduled backup created");
        }
        BackupOutcome::AlreadyExists { key } => {
            tracing::info!(key = %key, "Scheduled backup skipped, archive already exists");
        }
        BackupOutcome::Failed(err) => {
            tracing::error!(error = %err, kind = err.kind(), "Backup Error!");
        }
    }
}
