//! Workspace-owned external object stores.
//!
//! A client is built per request from the workspace's storage settings; the
//! gateway only ever asks it two things: does a key exist, and give me a
//! time-limited URL to PUT that key directly.

use crate::models::workspace::WorkspaceStorage;
use async_trait::async_trait;
use s3::{Bucket, Region, creds::Credentials, error::S3Error};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExternalStoreError {
    #[error("invalid storage configuration for workspace `{workspace}`: {reason}")]
    Config { workspace: String, reason: String },
    #[error(transparent)]
    S3(#[from] S3Error),
}

pub type ExternalStoreResult<T> = Result<T, ExternalStoreError>;

#[async_trait]
pub trait ExternalStore: Send + Sync {
    async fn exists(&self, key: &str) -> ExternalStoreResult<bool>;

    async fn presign_put(&self, key: &str, expiry_secs: u32) -> ExternalStoreResult<String>;
}

/// Builds an [`ExternalStore`] client for one workspace.
pub trait ExternalStoreConnector: Send + Sync {
    fn connect(
        &self,
        workspace_name: &str,
        storage: &WorkspaceStorage,
    ) -> ExternalStoreResult<Arc<dyn ExternalStore>>;
}

/// Connector for S3-compatible stores (path-style addressing).
#[derive(Clone, Copy, Debug, Default)]
pub struct S3Connector;

impl ExternalStoreConnector for S3Connector {
    fn connect(
        &self,
        workspace_name: &str,
        storage: &WorkspaceStorage,
    ) -> ExternalStoreResult<Arc<dyn ExternalStore>> {
        if storage.bucket.is_empty() || storage.endpoint.is_empty() {
            return Err(ExternalStoreError::Config {
                workspace: workspace_name.to_string(),
                reason: "bucket and endpoint are required".into(),
            });
        }

        let credentials = Credentials::new(
            Some(&storage.access_key),
            Some(&storage.secret_key),
            None,
            None,
            None,
        )
        .map_err(|err| ExternalStoreError::Config {
            workspace: workspace_name.to_string(),
            reason: err.to_string(),
        })?;

        let region = Region::Custom {
            region: storage.region.clone(),
            endpoint: storage.endpoint.clone(),
        };

        let bucket = Bucket::new(&storage.bucket, region, credentials)?.with_path_style();
        Ok(Arc::new(S3Store { bucket }))
    }
}

pub struct S3Store {
    bucket: Box<Bucket>,
}

#[async_trait]
impl ExternalStore for S3Store {
    async fn exists(&self, key: &str) -> ExternalStoreResult<bool> {
        Ok(self.bucket.object_exists(key).await?)
    }

    async fn presign_put(&self, key: &str, expiry_secs: u32) -> ExternalStoreResult<String> {
        Ok(self.bucket.presign_put(key, expiry_secs, None, None).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> WorkspaceStorage {
        WorkspaceStorage {
            bucket: "team-objects".into(),
            endpoint: "http://127.0.0.1:9000".into(),
            region: "us-east-1".into(),
            access_key: "access".into(),
            secret_key: "secret".into(),
        }
    }

    #[test]
    fn connector_rejects_missing_endpoint() {
        let mut cfg = storage();
        cfg.endpoint.clear();
        let err = S3Connector.connect("team-a", &cfg).err().unwrap();
        assert!(matches!(err, ExternalStoreError::Config { .. }));
    }

    #[tokio::test]
    async fn presigned_put_targets_key_with_expiry() {
        let store = S3Connector.connect("team-a", &storage()).unwrap();
        let url = store.presign_put("objects/obj-1", 86_400).await.unwrap();

        assert!(url.starts_with("http://127.0.0.1:9000/"));
        assert!(url.contains("/team-objects/objects/obj-1"));
        assert!(url.contains("X-Amz-Expires=86400"));
    }
}
