//! Storage backend selection.
//!
//! A workspace's storage mode is read once per request and turned into a
//! [`StorageBackend`], which every later step of that request goes through.

use crate::models::{object::Object, workspace::Workspace};
use crate::services::{
    external_store::{ExternalStore, ExternalStoreConnector, ExternalStoreError},
    local_store::LocalStore,
};
use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
};
use thiserror::Error;

/// Failure while probing physical storage.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("local storage: {0}")]
    Local(#[from] io::Error),
    #[error("external storage: {0}")]
    External(#[from] ExternalStoreError),
}

/// Where an object's bytes physically live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ObjectLocation {
    Local(PathBuf),
    External { bucket: String, key: String },
}

/// Storage capability resolved for one request.
#[derive(Clone)]
pub enum StorageBackend {
    Local {
        dir: PathBuf,
        fs: Arc<dyn LocalStore>,
    },
    External {
        bucket: String,
        prefix: String,
        store: Arc<dyn ExternalStore>,
    },
}

impl StorageBackend {
    pub fn uses_external_storage(&self) -> bool {
        matches!(self, StorageBackend::External { .. })
    }

    pub fn location(&self, object: &Object) -> ObjectLocation {
        match self {
            StorageBackend::Local { dir, .. } => ObjectLocation::Local(dir.join(&object.external_id)),
            StorageBackend::External { bucket, prefix, .. } => ObjectLocation::External {
                bucket: bucket.clone(),
                key: object_key(prefix, &object.external_id),
            },
        }
    }

    /// Check that the object's bytes are physically present.
    ///
    /// Transport failures are returned as errors and never reported as absent.
    pub async fn object_exists(&self, object: &Object) -> Result<bool, BackendError> {
        match self {
            StorageBackend::Local { dir, fs } => {
                Ok(fs.exists(&dir.join(&object.external_id)).await?)
            }
            StorageBackend::External { prefix, store, .. } => {
                Ok(store.exists(&object_key(prefix, &object.external_id)).await?)
            }
        }
    }

    /// Presigned PUT URL for the object's key. Local workspaces have no direct
    /// upload path and get `None`.
    pub async fn presign_upload(
        &self,
        object: &Object,
        expiry_secs: u32,
    ) -> Result<Option<String>, ExternalStoreError> {
        match self {
            StorageBackend::Local { .. } => Ok(None),
            StorageBackend::External { prefix, store, .. } => {
                let url = store
                    .presign_put(&object_key(prefix, &object.external_id), expiry_secs)
                    .await?;
                Ok(Some(url))
            }
        }
    }
}

/// Resolves workspaces to storage backends.
#[derive(Clone)]
pub struct BackendSelector {
    object_root: PathBuf,
    object_prefix: String,
    local: Arc<dyn LocalStore>,
    connector: Arc<dyn ExternalStoreConnector>,
}

impl BackendSelector {
    pub fn new(
        object_root: impl Into<PathBuf>,
        object_prefix: impl Into<String>,
        local: Arc<dyn LocalStore>,
        connector: Arc<dyn ExternalStoreConnector>,
    ) -> Self {
        Self {
            object_root: object_root.into(),
            object_prefix: object_prefix.into(),
            local,
            connector,
        }
    }

    /// `<object_root>/<workspace_name>`
    pub fn workspace_dir(&self, workspace: &Workspace) -> PathBuf {
        workspace_dir(&self.object_root, &workspace.name)
    }

    pub fn resolve(&self, workspace: &Workspace) -> Result<StorageBackend, ExternalStoreError> {
        match &workspace.storage {
            Some(storage) => Ok(StorageBackend::External {
                bucket: storage.bucket.clone(),
                prefix: self.object_prefix.clone(),
                store: self.connector.connect(&workspace.name, storage)?,
            }),
            None => Ok(StorageBackend::Local {
                dir: self.workspace_dir(workspace),
                fs: self.local.clone(),
            }),
        }
    }
}

pub fn workspace_dir(object_root: &Path, workspace_name: &str) -> PathBuf {
    object_root.join(workspace_name)
}

/// `<prefix>/<external_id>`
pub fn object_key(prefix: &str, external_id: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        external_id.to_string()
    } else {
        format!("{}/{}", prefix, external_id)
    }
}
