//! Metadata repository for object records.
//!
//! The `(hash, workspace_id)` unique index is the only arbiter of concurrent
//! duplicate creation: callers race freely and the losing insert surfaces as
//! [`RepositoryError::Conflict`].

use crate::models::object::Object;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("an object with this hash already exists in the workspace")]
    Conflict,
    #[error("object `{0}` not found")]
    NotFound(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Create/lookup/update/delete operations over object records.
#[async_trait]
pub trait ObjectRepository: Send + Sync {
    /// Returns `Ok(None)` on a miss; a miss is never an error.
    async fn get_by_hash(&self, hash: &str, workspace_id: Uuid) -> RepositoryResult<Option<Object>>;

    /// Inserts a new record with a fresh external id.
    async fn create(&self, hash: &str, size: i64, workspace_id: Uuid) -> RepositoryResult<Object>;

    async fn update_size(&self, external_id: &str, size: i64) -> RepositoryResult<()>;

    async fn delete_by_external_id(&self, external_id: &str) -> RepositoryResult<()>;
}

/// SQLite-backed [`ObjectRepository`].
#[derive(Clone)]
pub struct SqliteObjectRepository {
    db: Arc<SqlitePool>,
}

impl SqliteObjectRepository {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ObjectRepository for SqliteObjectRepository {
    async fn get_by_hash(&self, hash: &str, workspace_id: Uuid) -> RepositoryResult<Option<Object>> {
        let object = sqlx::query_as::<_, Object>(
            "SELECT id, external_id, hash, size, workspace_id, created_at
             FROM objects WHERE hash = ? AND workspace_id = ?",
        )
        .bind(hash)
        .bind(workspace_id)
        .fetch_optional(&*self.db)
        .await?;

        Ok(object)
    }

    async fn create(&self, hash: &str, size: i64, workspace_id: Uuid) -> RepositoryResult<Object> {
        let object = Object {
            id: Uuid::new_v4(),
            external_id: Uuid::new_v4().to_string(),
            hash: hash.to_string(),
            size,
            workspace_id,
            created_at: Utc::now(),
        };

        match sqlx::query(
            "INSERT INTO objects (id, external_id, hash, size, workspace_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(object.id)
        .bind(&object.external_id)
        .bind(&object.hash)
        .bind(object.size)
        .bind(object.workspace_id)
        .bind(object.created_at)
        .execute(&*self.db)
        .await
        {
            Ok(_) => Ok(object),
            Err(err) if is_unique_violation(&err) => Err(RepositoryError::Conflict),
            Err(err) => Err(RepositoryError::Sqlx(err)),
        }
    }

    async fn update_size(&self, external_id: &str, size: i64) -> RepositoryResult<()> {
        let result = sqlx::query("UPDATE objects SET size = ? WHERE external_id = ?")
            .bind(size)
            .bind(external_id)
            .execute(&*self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(external_id.to_string()));
        }
        Ok(())
    }

    async fn delete_by_external_id(&self, external_id: &str) -> RepositoryResult<()> {
        sqlx::query("DELETE FROM objects WHERE external_id = ?")
            .bind(external_id)
            .execute(&*self.db)
            .await?;
        Ok(())
    }
}

/// Return true if SQLx error indicates a unique constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}
