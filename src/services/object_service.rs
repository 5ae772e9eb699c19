//! ObjectService — existence checks, record creation and streaming uploads
//! for content-addressed objects.
//!
//! Metadata lives behind an [`ObjectRepository`]; bytes live either on the
//! gateway's filesystem (`<object_root>/<workspace>/<external_id>`) or in the
//! workspace's own external store (`<object_prefix>/<external_id>`). Each
//! call resolves the workspace's backend once and uses it throughout.

use crate::models::{
    object::{Object, ObjectChunk},
    workspace::Workspace,
};
use crate::services::{
    backend::{BackendSelector, StorageBackend},
    error::{ObjectError, ObjectResult},
    external_store::ExternalStoreConnector,
    ingest::{IngestedObject, Ingestion},
    local_store::LocalStore,
    object_repository::{ObjectRepository, RepositoryError},
};
use futures::Stream;
use std::{io, path::PathBuf, sync::Arc};
use tracing::{debug, info, warn};

/// Lifetime of presigned upload URLs, in seconds.
pub const OBJECT_PUT_EXPIRATION_SECS: u32 = 60 * 60 * 24;

pub const DEFAULT_OBJECT_PREFIX: &str = "objects";

/// Immutable settings shared by every request.
#[derive(Clone, Debug)]
pub struct ObjectServiceConfig {
    /// Root directory for gateway-managed object payloads.
    pub object_root: PathBuf,
    /// Key prefix for objects kept in external workspace stores.
    pub object_prefix: String,
}

impl ObjectServiceConfig {
    pub fn new(object_root: impl Into<PathBuf>) -> Self {
        Self {
            object_root: object_root.into(),
            object_prefix: DEFAULT_OBJECT_PREFIX.to_string(),
        }
    }
}

/// Result of an existence check. `object` is set only when both the record
/// and the physical bytes are present.
#[derive(Clone, Debug)]
pub struct ExistenceReport {
    pub object: Option<Object>,
    pub use_workspace_storage: bool,
}

impl ExistenceReport {
    pub fn exists(&self) -> bool {
        self.object.is_some()
    }
}

/// Result of a create-or-reuse request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreatedObject {
    pub object_id: String,
    pub upload_url: Option<String>,
}

#[derive(Clone)]
pub struct ObjectService {
    repo: Arc<dyn ObjectRepository>,
    local: Arc<dyn LocalStore>,
    backends: BackendSelector,
    config: ObjectServiceConfig,
}

impl ObjectService {
    pub fn new(
        config: ObjectServiceConfig,
        repo: Arc<dyn ObjectRepository>,
        local: Arc<dyn LocalStore>,
        connector: Arc<dyn ExternalStoreConnector>,
    ) -> Self {
        let backends = BackendSelector::new(
            config.object_root.clone(),
            config.object_prefix.clone(),
            local.clone(),
            connector,
        );
        Self {
            repo,
            local,
            backends,
            config,
        }
    }

    pub fn config(&self) -> &ObjectServiceConfig {
        &self.config
    }

    /// Does an object with `hash` exist in the workspace, both as a record
    /// and physically?
    ///
    /// A missing record is a normal `exists = false`. Failing to reach the
    /// storage backend is an error, never an implicit "absent".
    pub async fn resolve_existence(
        &self,
        hash: &str,
        workspace: &Workspace,
    ) -> ObjectResult<ExistenceReport> {
        let Some(object) = self
            .repo
            .get_by_hash(hash, workspace.id)
            .await
            .map_err(ObjectError::Lookup)?
        else {
            // A miss never needs the backend client.
            return Ok(ExistenceReport {
                object: None,
                use_workspace_storage: workspace.is_externally_backed(),
            });
        };

        let backend = self.resolve_backend(workspace)?;
        let use_workspace_storage = backend.uses_external_storage();
        let absent = ExistenceReport {
            object: None,
            use_workspace_storage,
        };
        let present = backend
            .object_exists(&object)
            .await
            .map_err(ObjectError::ExistenceCheck)?;

        if !present {
            debug!(
                workspace = %workspace.name,
                hash,
                object_id = %object.external_id,
                "object record present but payload missing"
            );
            return Ok(absent);
        }

        Ok(ExistenceReport {
            object: Some(object),
            use_workspace_storage,
        })
    }

    /// Create a record for `hash`, or reuse the existing one.
    ///
    /// Without `overwrite`, an existing record short-circuits with its id and
    /// no URL. Otherwise a presigned upload URL is issued for the (new or
    /// reused) record when the workspace uses external storage.
    pub async fn create_or_reuse(
        &self,
        hash: &str,
        size: i64,
        overwrite: bool,
        workspace: &Workspace,
    ) -> ObjectResult<CreatedObject> {
        self.local
            .ensure_dir(&self.backends.workspace_dir(workspace))
            .await
            .map_err(ObjectError::PrepareDirectory)?;

        let backend = self.resolve_backend(workspace)?;

        let existing = self
            .repo
            .get_by_hash(hash, workspace.id)
            .await
            .map_err(ObjectError::Lookup)?;

        let object = match existing {
            Some(object) if !overwrite => return Ok(reused(object)),
            Some(object) => object,
            None => match self.repo.create(hash, size, workspace.id).await {
                Ok(object) => {
                    info!(workspace = %workspace.name, hash, object_id = %object.external_id, "object created");
                    object
                }
                Err(RepositoryError::Conflict) => {
                    // Lost a race with a concurrent creator; its record wins.
                    let winner = self
                        .repo
                        .get_by_hash(hash, workspace.id)
                        .await
                        .map_err(ObjectError::Lookup)?
                        .ok_or(ObjectError::Create(RepositoryError::Conflict))?;
                    if !overwrite {
                        return Ok(reused(winner));
                    }
                    winner
                }
                Err(err) => return Err(ObjectError::Create(err)),
            },
        };

        let upload_url = backend
            .presign_upload(&object, OBJECT_PUT_EXPIRATION_SECS)
            .await
            .map_err(|err| {
                warn!(object_id = %object.external_id, error = %err, "presigning upload failed");
                ObjectError::Presign(err)
            })?;

        Ok(CreatedObject {
            object_id: object.external_id,
            upload_url,
        })
    }

    /// Ingest an ordered chunk stream into gateway-local storage.
    pub async fn ingest_stream<S>(
        &self,
        workspace: &Workspace,
        chunks: S,
    ) -> ObjectResult<IngestedObject>
    where
        S: Stream<Item = io::Result<ObjectChunk>> + Send,
    {
        Ingestion::new(
            self.repo.clone(),
            self.local.clone(),
            self.backends.workspace_dir(workspace),
        )
        .run(workspace, chunks)
        .await
    }

    fn resolve_backend(&self, workspace: &Workspace) -> ObjectResult<StorageBackend> {
        self.backends.resolve(workspace).map_err(|err| {
            warn!(workspace = %workspace.name, error = %err, "unable to create storage client");
            ObjectError::StorageClient(err)
        })
    }
}

fn reused(object: Object) -> CreatedObject {
    CreatedObject {
        object_id: object.external_id,
        upload_url: None,
    }
}
