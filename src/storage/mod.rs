//! Object store gateway
//!
//! Key-addressed durable storage for archives. The backup flow only needs
//! `exists` and `put`; `get` serves the restore path.

pub(crate) mod s3;
#[cfg(test)]
pub(crate) mod memory;

use async_trait::async_trait;

use crate::backup::archive::ArchivePayload;
use crate::errors::GatewayError;

pub use s3::S3Gateway;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// `Ok(false)` when the store reports the key as missing; any other failure
    /// is `GatewayError::Unavailable`.
    async fn exists(&self, key: &str) -> Result<bool, GatewayError>;

    /// Uploads `payload` under `key`.
    ///
    /// Refuses to replace an existing object and returns
    /// `GatewayError::AlreadyExists` instead.
    async fn put(&self, key: &str, payload: &ArchivePayload) -> Result<(), GatewayError>;

    async fn get(&self, key: &str) -> Result<ArchivePayload, GatewayError>;
}
