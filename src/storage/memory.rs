// mongobackup/src/storage/memory.rs
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use super::ObjectStore;
use crate::backup::archive::ArchivePayload;
use crate::errors::GatewayError;

/// In-process store with the same no-overwrite rule as the S3 gateway.
#[derive(Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
    puts: AtomicUsize,
}

impl MemoryStore {
    pub fn put_calls(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub async fn insert(&self, key: &str, bytes: Vec<u8>) {
        self.objects.write().await.insert(key.to_string(), bytes);
    }

    pub async fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.read().await.get(key).cloned()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn exists(&self, key: &str) -> Result<bool, GatewayError> {
        Ok(self.objects.read().await.contains_key(key))
    }

    async fn put(&self, key: &str, payload: &ArchivePayload) -> Result<(), GatewayError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        let bytes = payload
            .read_all()
            .await
            .map_err(|e| GatewayError::UploadFailed(e.to_string()))?;

        let mut objects = self.objects.write().await;
        if objects.contains_key(key) {
            return Err(GatewayError::AlreadyExists(key.to_string()));
        }
        objects.insert(key.to_string(), bytes);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<ArchivePayload, GatewayError> {
        self.objects
            .read()
            .await
            .get(key)
            .cloned()
            .map(ArchivePayload::Memory)
            .ok_or_else(|| GatewayError::NotFound(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn exists_flips_after_put() -> anyhow::Result<()> {
        let store = MemoryStore::default();
        assert!(!store.exists("mongodb-backup-2024-03-10.gzip").await?);

        store
            .put("mongodb-backup-2024-03-10.gzip", &ArchivePayload::Memory(b"P".to_vec()))
            .await?;
        assert!(store.exists("mongodb-backup-2024-03-10.gzip").await?);
        assert!(!store.exists("mongodb-backup-2024-03-11.gzip").await?);
        Ok(())
    }

    #[tokio::test]
    async fn put_never_overwrites() -> anyhow::Result<()> {
        let store = MemoryStore::default();
        store.put("k", &ArchivePayload::Memory(b"first".to_vec())).await?;
        let second = store.put("k", &ArchivePayload::Memory(b"second".to_vec())).await;

        assert!(matches!(second, Err(GatewayError::AlreadyExists(_))));
        assert_eq!(store.object("k").await, Some(b"first".to_vec()));
        Ok(())
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let store = MemoryStore::default();
        assert!(matches!(store.get("nope").await, Err(GatewayError::NotFound(_))));
    }
}
