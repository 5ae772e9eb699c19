//! Fault-injecting collaborators.

use async_trait::async_trait;
use object_gateway::models::object::Object;
use object_gateway::models::workspace::WorkspaceStorage;
use object_gateway::services::external_store::{
    ExternalStore, ExternalStoreConnector, ExternalStoreError, ExternalStoreResult,
};
use object_gateway::services::local_store::{DiskStore, LocalStore, ObjectWriter};
use object_gateway::services::object_repository::{
    ObjectRepository, RepositoryError, RepositoryResult,
};
use std::collections::HashSet;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Disk-backed [`LocalStore`] that fails on demand.
#[derive(Default)]
#[allow(dead_code)]
pub struct FaultyStore {
    pub fail_create: bool,
    /// 1-based index of the chunk whose write fails.
    pub fail_write_at: Option<usize>,
    pub fail_sync: bool,
}

#[async_trait]
impl LocalStore for FaultyStore {
    async fn ensure_dir(&self, dir: &Path) -> io::Result<()> {
        DiskStore.ensure_dir(dir).await
    }

    async fn create(&self, path: &Path) -> io::Result<Box<dyn ObjectWriter>> {
        if self.fail_create {
            return Err(io::Error::other("simulated create failure"));
        }
        let inner = DiskStore.create(path).await?;
        Ok(Box::new(FaultyWriter {
            inner,
            writes: 0,
            fail_write_at: self.fail_write_at,
            fail_sync: self.fail_sync,
        }))
    }

    async fn remove(&self, path: &Path) -> io::Result<()> {
        DiskStore.remove(path).await
    }

    async fn exists(&self, path: &Path) -> io::Result<bool> {
        DiskStore.exists(path).await
    }
}

struct FaultyWriter {
    inner: Box<dyn ObjectWriter>,
    writes: usize,
    fail_write_at: Option<usize>,
    fail_sync: bool,
}

#[async_trait]
impl ObjectWriter for FaultyWriter {
    async fn write_chunk(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.writes += 1;
        if self.fail_write_at == Some(self.writes) {
            return Err(io::Error::other("simulated disk error"));
        }
        self.inner.write_chunk(bytes).await
    }

    async fn sync(&mut self) -> io::Result<()> {
        if self.fail_sync {
            return Err(io::Error::other("simulated fsync failure"));
        }
        self.inner.sync().await
    }
}

/// Wraps a real repository; can fail size updates, can hide records from
/// the first `get_by_hash` calls to reproduce a lost creation race, and can
/// stall deletes.
#[allow(dead_code)]
pub struct FlakyRepository {
    pub inner: Arc<dyn ObjectRepository>,
    pub fail_update_size: AtomicBool,
    pub hide_lookups: AtomicUsize,
    /// Milliseconds each `delete_by_external_id` sleeps before deleting.
    pub delete_delay_ms: AtomicU64,
    pub deletes_started: AtomicUsize,
}

#[allow(dead_code)]
impl FlakyRepository {
    pub fn new(inner: Arc<dyn ObjectRepository>) -> Self {
        Self {
            inner,
            fail_update_size: AtomicBool::new(false),
            hide_lookups: AtomicUsize::new(0),
            delete_delay_ms: AtomicU64::new(0),
            deletes_started: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ObjectRepository for FlakyRepository {
    async fn get_by_hash(&self, hash: &str, workspace_id: Uuid) -> RepositoryResult<Option<Object>> {
        let hidden = self
            .hide_lookups
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if hidden {
            return Ok(None);
        }
        self.inner.get_by_hash(hash, workspace_id).await
    }

    async fn create(&self, hash: &str, size: i64, workspace_id: Uuid) -> RepositoryResult<Object> {
        self.inner.create(hash, size, workspace_id).await
    }

    async fn update_size(&self, external_id: &str, size: i64) -> RepositoryResult<()> {
        if self.fail_update_size.load(Ordering::SeqCst) {
            return Err(RepositoryError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        self.inner.update_size(external_id, size).await
    }

    async fn delete_by_external_id(&self, external_id: &str) -> RepositoryResult<()> {
        self.deletes_started.fetch_add(1, Ordering::SeqCst);
        let delay = self.delete_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
        }
        self.inner.delete_by_external_id(external_id).await
    }
}

/// In-memory stand-in for a workspace's external store.
#[derive(Default)]
#[allow(dead_code)]
pub struct MemoryExternalStore {
    pub keys: Mutex<HashSet<String>>,
    pub fail_exists: AtomicBool,
    pub fail_presign: AtomicBool,
    pub presigned: AtomicUsize,
}

#[allow(dead_code)]
impl MemoryExternalStore {
    pub fn put(&self, key: &str) {
        self.keys.lock().unwrap().insert(key.to_string());
    }

    pub fn remove(&self, key: &str) {
        self.keys.lock().unwrap().remove(key);
    }
}

fn unreachable_store() -> ExternalStoreError {
    ExternalStoreError::Config {
        workspace: "test".into(),
        reason: "store unreachable".into(),
    }
}

#[async_trait]
impl ExternalStore for MemoryExternalStore {
    async fn exists(&self, key: &str) -> ExternalStoreResult<bool> {
        if self.fail_exists.load(Ordering::SeqCst) {
            return Err(unreachable_store());
        }
        Ok(self.keys.lock().unwrap().contains(key))
    }

    async fn presign_put(&self, key: &str, expiry_secs: u32) -> ExternalStoreResult<String> {
        if self.fail_presign.load(Ordering::SeqCst) {
            return Err(unreachable_store());
        }
        let n = self.presigned.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!(
            "https://storage.test/{}?expires={}&sig={}",
            key, expiry_secs, n
        ))
    }
}

#[allow(dead_code)]
pub struct MemoryConnector {
    pub store: Arc<MemoryExternalStore>,
    pub fail_connect: AtomicBool,
}

#[allow(dead_code)]
impl MemoryConnector {
    pub fn new(store: Arc<MemoryExternalStore>) -> Self {
        Self {
            store,
            fail_connect: AtomicBool::new(false),
        }
    }
}

impl ExternalStoreConnector for MemoryConnector {
    fn connect(
        &self,
        workspace_name: &str,
        _storage: &WorkspaceStorage,
    ) -> ExternalStoreResult<Arc<dyn ExternalStore>> {
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(ExternalStoreError::Config {
                workspace: workspace_name.to_string(),
                reason: "credentials rejected".into(),
            });
        }
        Ok(self.store.clone())
    }
}
