//! In-memory reference provider
//!
//! Used for testing and development. Not persistent. Carries operation
//! counters and failure-injection switches so tests can assert call
//! counts and simulate backend outages, including calls that never
//! return.

use crate::client::{ProviderClient, ProviderKind};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use stratus_core::chunk::{ChunkKey, ProviderId};
use stratus_core::error::{Result, StratusError};

/// In-memory provider backend
pub struct MemoryProvider {
    id: ProviderId,
    name: String,

    /// Remote name -> stored bytes
    objects: RwLock<HashMap<String, Bytes>>,

    /// Operation counters
    uploads: AtomicU64,
    downloads: AtomicU64,
    deletes: AtomicU64,

    /// Failure injection
    fail_uploads: AtomicBool,
    fail_downloads: AtomicBool,
    fail_deletes: AtomicBool,
    stall_uploads: AtomicBool,
    stall_downloads: AtomicBool,
}

impl MemoryProvider {
    /// Create a new in-memory provider
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(ProviderId::new(), name)
    }

    /// Create a provider under an externally assigned identity
    pub fn with_id(id: ProviderId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            objects: RwLock::new(HashMap::new()),
            uploads: AtomicU64::new(0),
            downloads: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
            fail_uploads: AtomicBool::new(false),
            fail_downloads: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
            stall_uploads: AtomicBool::new(false),
            stall_downloads: AtomicBool::new(false),
        }
    }

    /// Make every subsequent upload fail with a transport error
    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent download fail with a transport error
    pub fn set_fail_downloads(&self, fail: bool) {
        self.fail_downloads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent delete fail with a transport error
    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent upload hang until the caller's timeout fires
    pub fn set_stall_uploads(&self, stall: bool) {
        self.stall_uploads.store(stall, Ordering::SeqCst);
    }

    /// Make every subsequent download hang until the caller's timeout fires
    pub fn set_stall_downloads(&self, stall: bool) {
        self.stall_downloads.store(stall, Ordering::SeqCst);
    }

    /// Number of uploads attempted (including injected failures)
    pub fn upload_count(&self) -> u64 {
        self.uploads.load(Ordering::Relaxed)
    }

    /// Number of downloads attempted (including injected failures)
    pub fn download_count(&self) -> u64 {
        self.downloads.load(Ordering::Relaxed)
    }

    /// Number of deletes performed
    pub fn delete_count(&self) -> u64 {
        self.deletes.load(Ordering::Relaxed)
    }

    /// Number of objects currently stored
    pub fn object_count(&self) -> usize {
        self.objects.read().len()
    }

    /// True if a chunk is stored under `key`
    pub fn contains(&self, key: &ChunkKey) -> bool {
        self.objects.read().contains_key(&key.remote_name())
    }
}

#[async_trait]
impl ProviderClient for MemoryProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Memory
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn upload(&self, key: &ChunkKey, data: Bytes) -> Result<serde_json::Value> {
        self.uploads.fetch_add(1, Ordering::Relaxed);

        if self.stall_uploads.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StratusError::Transport {
                provider: self.name.clone(),
                message: "injected upload failure".to_string(),
            });
        }

        self.objects.write().insert(key.remote_name(), data);
        Ok(serde_json::Value::Null)
    }

    async fn download(&self, key: &ChunkKey, _attrs: &serde_json::Value) -> Result<Bytes> {
        self.downloads.fetch_add(1, Ordering::Relaxed);

        if self.stall_downloads.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail_downloads.load(Ordering::SeqCst) {
            return Err(StratusError::Transport {
                provider: self.name.clone(),
                message: "injected download failure".to_string(),
            });
        }

        self.objects
            .read()
            .get(&key.remote_name())
            .cloned()
            .ok_or_else(|| StratusError::ChunkMissing {
                provider: self.name.clone(),
                key: key.remote_name(),
            })
    }

    async fn delete(&self, key: &ChunkKey, _attrs: &serde_json::Value) -> Result<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StratusError::Transport {
                provider: self.name.clone(),
                message: "injected delete failure".to_string(),
            });
        }

        if self.objects.write().remove(&key.remote_name()).is_some() {
            self.deletes.fetch_add(1, Ordering::Relaxed);
            Ok(())
        } else {
            Err(StratusError::ChunkMissing {
                provider: self.name.clone(),
                key: key.remote_name(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratus_core::chunk::ChunkId;

    fn key() -> ChunkKey {
        ChunkKey::new("test-user", ChunkId::generate())
    }

    #[tokio::test]
    async fn test_upload_download() {
        let provider = MemoryProvider::new("mem-1");
        let key = key();
        let data = Bytes::from_static(b"hello");

        let attrs = provider.upload(&key, data.clone()).await.unwrap();
        let retrieved = provider.download(&key, &attrs).await.unwrap();
        assert_eq!(retrieved, data);
        assert_eq!(provider.upload_count(), 1);
        assert_eq!(provider.download_count(), 1);
    }

    #[tokio::test]
    async fn test_download_missing() {
        let provider = MemoryProvider::new("mem-1");
        let result = provider.download(&key(), &serde_json::Value::Null).await;
        assert!(matches!(result, Err(StratusError::ChunkMissing { .. })));
    }

    #[tokio::test]
    async fn test_delete_is_reported_missing_when_absent() {
        let provider = MemoryProvider::new("mem-1");
        let key = key();

        provider.upload(&key, Bytes::from_static(b"x")).await.unwrap();
        provider.delete(&key, &serde_json::Value::Null).await.unwrap();
        assert!(!provider.contains(&key));

        let result = provider.delete(&key, &serde_json::Value::Null).await;
        assert!(matches!(result, Err(StratusError::ChunkMissing { .. })));
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let provider = MemoryProvider::new("mem-1");
        let key = key();

        provider.set_fail_uploads(true);
        let result = provider.upload(&key, Bytes::from_static(b"y")).await;
        assert!(matches!(result, Err(StratusError::Transport { .. })));
        assert_eq!(provider.object_count(), 0);

        provider.set_fail_uploads(false);
        provider.upload(&key, Bytes::from_static(b"y")).await.unwrap();

        provider.set_fail_downloads(true);
        let result = provider.download(&key, &serde_json::Value::Null).await;
        assert!(matches!(result, Err(StratusError::Transport { .. })));
    }

    #[tokio::test]
    async fn test_namespace_isolation() {
        let provider = MemoryProvider::new("mem-1");
        let id = ChunkId::generate();
        let a = ChunkKey::new("user-a", id);
        let b = ChunkKey::new("user-b", id);

        provider.upload(&a, Bytes::from_static(b"shared")).await.unwrap();
        assert!(provider.contains(&a));
        assert!(!provider.contains(&b));
    }
}
