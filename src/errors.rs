// mongobackup/src/errors.rs
use thiserror::Error;

/// Failures of the archive producer (the `mongodump` shell-out).
#[derive(Error, Debug)]
pub enum ProducerError {
    #[error("Invalid connection target: {0}")]
    InvalidTarget(String),

    #[error("Database dump failed: {0}")]
    DumpFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of the object store gateway.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Object store unavailable: {0}")]
    Unavailable(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Object already exists: {0}")]
    AlreadyExists(String),

    #[error("Object not found: {0}")]
    NotFound(String),
}

/// Closed taxonomy reported through `BackupOutcome::Failed`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackupError {
    #[error("Invalid connection target: {0}")]
    InvalidTarget(String),

    #[error("Database dump failed: {0}")]
    DumpFailed(String),

    #[error("Object store unavailable: {0}")]
    GatewayUnavailable(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),
}

impl BackupError {
    /// Stable name used in logs and in the `name` field of error responses.
    pub fn kind(&self) -> &'static str {
        match self {
            BackupError::InvalidTarget(_) => "InvalidTarget",
            BackupError::DumpFailed(_) => "DumpFailed",
            BackupError::GatewayUnavailable(_) => "GatewayUnavailable",
            BackupError::UploadFailed(_) => "UploadFailed",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            BackupError::InvalidTarget(_) | BackupError::DumpFailed(_) => 500,
            BackupError::GatewayUnavailable(_) => 503,
            BackupError::UploadFailed(_) => 502,
        }
    }
}

impl From<ProducerError> for BackupError {
    fn from(err: ProducerError) -> Self {
        match err {
            ProducerError::InvalidTarget(msg) => BackupError::InvalidTarget(msg),
            ProducerError::DumpFailed(msg) => BackupError::DumpFailed(msg),
            ProducerError::Io(e) => BackupError::DumpFailed(e.to_string()),
        }
    }
}
