//! Gateway-managed filesystem access.

use async_trait::async_trait;
use std::{
    io::{self, ErrorKind},
    path::Path,
};
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};

/// Filesystem operations the gateway needs for local object payloads.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Create `dir` and its parents; succeeds if it already exists.
    async fn ensure_dir(&self, dir: &Path) -> io::Result<()>;

    /// Create (or truncate) the payload file at `path`.
    async fn create(&self, path: &Path) -> io::Result<Box<dyn ObjectWriter>>;

    /// Remove the payload file; a missing file is not an error.
    async fn remove(&self, path: &Path) -> io::Result<()>;

    async fn exists(&self, path: &Path) -> io::Result<bool>;
}

/// An open payload file owned by one upload stream.
#[async_trait]
pub trait ObjectWriter: Send {
    async fn write_chunk(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Flush buffered bytes and fsync the file.
    async fn sync(&mut self) -> io::Result<()>;
}

/// [`LocalStore`] backed by tokio's filesystem API.
#[derive(Clone, Copy, Debug, Default)]
pub struct DiskStore;

#[async_trait]
impl LocalStore for DiskStore {
    async fn ensure_dir(&self, dir: &Path) -> io::Result<()> {
        fs::create_dir_all(dir).await
    }

    async fn create(&self, path: &Path) -> io::Result<Box<dyn ObjectWriter>> {
        let file = File::create(path).await?;
        Ok(Box::new(DiskWriter { file }))
    }

    async fn remove(&self, path: &Path) -> io::Result<()> {
        match fs::remove_file(path).await {
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }

    async fn exists(&self, path: &Path) -> io::Result<bool> {
        fs::try_exists(path).await
    }
}

struct DiskWriter {
    file: File,
}

#[async_trait]
impl ObjectWriter for DiskWriter {
    async fn write_chunk(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.file.write_all(bytes).await
    }

    async fn sync(&mut self) -> io::Result<()> {
        self.file.flush().await?;
        // Required on write-back filesystems (e.g. network mounts) before the
        // upload is reported as complete.
        self.file.sync_all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn write_sync_and_remove_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("team-a");
        let store = DiskStore;

        store.ensure_dir(&dir).await.unwrap();
        store.ensure_dir(&dir).await.unwrap();

        let path = dir.join("object-1");
        let mut writer = store.create(&path).await.unwrap();
        writer.write_chunk(b"abcd").await.unwrap();
        writer.write_chunk(b"efghij").await.unwrap();
        writer.sync().await.unwrap();
        drop(writer);

        assert!(store.exists(&path).await.unwrap());
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"abcdefghij");

        store.remove(&path).await.unwrap();
        assert!(!store.exists(&path).await.unwrap());
        // Removing twice is fine.
        store.remove(&path).await.unwrap();
    }
}
