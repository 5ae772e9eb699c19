//! Shared state handed to every handler.

use crate::services::{
    external_store::S3Connector,
    local_store::DiskStore,
    object_repository::SqliteObjectRepository,
    object_service::{ObjectService, ObjectServiceConfig},
    workspace_repository::{SqliteWorkspaceRepository, WorkspaceRepository},
};
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    /// Shared SQLite pool, also probed by the readiness check.
    pub db: Arc<SqlitePool>,
    pub objects: ObjectService,
    pub workspaces: Arc<dyn WorkspaceRepository>,
}

impl AppState {
    /// Production wiring: SQLite metadata, local disk, S3-compatible
    /// workspace stores.
    pub fn new(db: Arc<SqlitePool>, config: ObjectServiceConfig) -> Self {
        let objects = ObjectService::new(
            config,
            Arc::new(SqliteObjectRepository::new(db.clone())),
            Arc::new(DiskStore),
            Arc::new(S3Connector),
        );
        Self::from_parts(db.clone(), objects, Arc::new(SqliteWorkspaceRepository::new(db)))
    }

    pub fn from_parts(
        db: Arc<SqlitePool>,
        objects: ObjectService,
        workspaces: Arc<dyn WorkspaceRepository>,
    ) -> Self {
        Self {
            db,
            objects,
            workspaces,
        }
    }
}
