use super::fakes::{MemoryConnector, MemoryExternalStore};
use futures::Stream;
use object_gateway::db;
use object_gateway::models::object::ObjectChunk;
use object_gateway::models::workspace::{Workspace, WorkspaceStorage};
use object_gateway::services::local_store::{DiskStore, LocalStore};
use object_gateway::services::object_repository::{ObjectRepository, SqliteObjectRepository};
use object_gateway::services::object_service::{ObjectService, ObjectServiceConfig};
use object_gateway::services::workspace_repository::{
    SqliteWorkspaceRepository, WorkspaceRepository,
};
use object_gateway::state::AppState;
use sqlx::SqlitePool;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// In-memory SQLite, a temporary object root and an in-memory external
/// store shared by every service built from it.
#[allow(dead_code)]
pub struct TestEnv {
    pub tmp: TempDir,
    pub db: Arc<SqlitePool>,
    pub repo: Arc<SqliteObjectRepository>,
    pub workspaces: Arc<SqliteWorkspaceRepository>,
    pub external: Arc<MemoryExternalStore>,
    pub connector: Arc<MemoryConnector>,
}

#[allow(dead_code)]
impl TestEnv {
    pub async fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let db = Arc::new(db::connect_in_memory().await.expect("open sqlite"));
        let external = Arc::new(MemoryExternalStore::default());
        Self {
            repo: Arc::new(SqliteObjectRepository::new(db.clone())),
            workspaces: Arc::new(SqliteWorkspaceRepository::new(db.clone())),
            connector: Arc::new(MemoryConnector::new(external.clone())),
            external,
            db,
            tmp,
        }
    }

    pub fn object_root(&self) -> PathBuf {
        self.tmp.path().join("objects")
    }

    pub fn config(&self) -> ObjectServiceConfig {
        ObjectServiceConfig::new(self.object_root())
    }

    pub fn service(&self) -> ObjectService {
        self.service_with(Arc::new(DiskStore), self.repo.clone())
    }

    pub fn service_with(
        &self,
        local: Arc<dyn LocalStore>,
        repo: Arc<dyn ObjectRepository>,
    ) -> ObjectService {
        ObjectService::new(self.config(), repo, local, self.connector.clone())
    }

    pub fn app_state(&self) -> AppState {
        AppState::from_parts(self.db.clone(), self.service(), self.workspaces.clone())
    }

    pub async fn local_workspace(&self, name: &str) -> Workspace {
        self.workspaces
            .create(name, None)
            .await
            .expect("create local workspace")
    }

    pub async fn external_workspace(&self, name: &str) -> Workspace {
        let storage = WorkspaceStorage {
            bucket: format!("{}-bucket", name),
            endpoint: "http://storage.test".into(),
            region: "us-east-1".into(),
            access_key: "access".into(),
            secret_key: "secret".into(),
        };
        self.workspaces
            .create(name, Some(storage))
            .await
            .expect("create external workspace")
    }

    pub fn object_path(&self, workspace: &Workspace, external_id: &str) -> PathBuf {
        self.object_root().join(&workspace.name).join(external_id)
    }

    pub async fn object_count(&self) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM objects")
            .fetch_one(&*self.db)
            .await
            .expect("count objects")
    }

    /// Files currently in the workspace's object directory.
    pub async fn files_in(&self, workspace: &Workspace) -> Vec<PathBuf> {
        let dir = self.object_root().join(&workspace.name);
        let mut files = Vec::new();
        if let Ok(mut entries) = tokio::fs::read_dir(&dir).await {
            while let Ok(Some(entry)) = entries.next_entry().await {
                files.push(entry.path());
            }
        }
        files
    }
}

/// A successful chunk stream over `chunks`.
#[allow(dead_code)]
pub fn chunk_stream(
    chunks: Vec<ObjectChunk>,
) -> impl Stream<Item = io::Result<ObjectChunk>> + Send {
    futures::stream::iter(chunks.into_iter().map(Ok))
}
