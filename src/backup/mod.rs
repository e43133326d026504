mod logic;
pub(crate) mod archive; // Day-slot keys and archive payloads
pub(crate) mod db_dump; // mongodump-backed archive producer

use std::sync::Arc;

use crate::config::{BackupSettings, MongoConfig};
use crate::storage::ObjectStore;
use crate::utils::clock::SystemClock;

pub use logic::{BackupOrchestrator, BackupOutcome};

/// Wires the production orchestrator: `mongodump` producer, the given store and the system clock.
pub fn build_orchestrator(
    mongo: &MongoConfig,
    settings: &BackupSettings,
    store: Arc<dyn ObjectStore>,
) -> anyhow::Result<BackupOrchestrator> {
    let target = mongo.connection_target()?;
    let producer = db_dump::MongoDumpProducer::new(
        settings.mongodump_path.clone(),
        settings.work_dir.clone(),
    );
    Ok(BackupOrchestrator::new(
        Arc::new(producer),
        store,
        Arc::new(SystemClock),
        target,
    ))
}
