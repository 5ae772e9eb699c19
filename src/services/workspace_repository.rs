//! Workspace registry backed by SQLite.
//!
//! Workspace names become directory components under the local object root,
//! so they are validated with DNS-like rules before they are ever stored.

use crate::models::workspace::{Workspace, WorkspaceRow, WorkspaceStorage};
use crate::services::object_repository::is_unique_violation;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

const WORKSPACE_NAME_MIN_LEN: usize = 3;
const WORKSPACE_NAME_MAX_LEN: usize = 63;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("workspace `{name}` invalid: {reason}")]
    InvalidName { name: String, reason: String },
    #[error("workspace `{0}` already exists")]
    AlreadyExists(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type WorkspaceResult<T> = Result<T, WorkspaceError>;

#[async_trait]
pub trait WorkspaceRepository: Send + Sync {
    async fn get_by_name(&self, name: &str) -> WorkspaceResult<Option<Workspace>>;

    async fn create(
        &self,
        name: &str,
        storage: Option<WorkspaceStorage>,
    ) -> WorkspaceResult<Workspace>;
}

#[derive(Clone)]
pub struct SqliteWorkspaceRepository {
    db: Arc<SqlitePool>,
}

impl SqliteWorkspaceRepository {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl WorkspaceRepository for SqliteWorkspaceRepository {
    async fn get_by_name(&self, name: &str) -> WorkspaceResult<Option<Workspace>> {
        let row = sqlx::query_as::<_, WorkspaceRow>(
            "SELECT id, name, storage_bucket, storage_endpoint, storage_region,
                    storage_access_key, storage_secret_key, created_at
             FROM workspaces WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&*self.db)
        .await?;

        Ok(row.map(Workspace::from))
    }

    async fn create(
        &self,
        name: &str,
        storage: Option<WorkspaceStorage>,
    ) -> WorkspaceResult<Workspace> {
        ensure_workspace_name_safe(name)?;

        let workspace = Workspace {
            id: Uuid::new_v4(),
            name: name.to_string(),
            storage,
            created_at: Utc::now(),
        };
        let storage = workspace.storage.as_ref();

        match sqlx::query(
            "INSERT INTO workspaces (id, name, storage_bucket, storage_endpoint, storage_region,
                                     storage_access_key, storage_secret_key, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(workspace.id)
        .bind(&workspace.name)
        .bind(storage.map(|s| s.bucket.as_str()))
        .bind(storage.map(|s| s.endpoint.as_str()))
        .bind(storage.map(|s| s.region.as_str()))
        .bind(storage.map(|s| s.access_key.as_str()))
        .bind(storage.map(|s| s.secret_key.as_str()))
        .bind(workspace.created_at)
        .execute(&*self.db)
        .await
        {
            Ok(_) => Ok(workspace),
            Err(err) if is_unique_violation(&err) => {
                Err(WorkspaceError::AlreadyExists(name.to_string()))
            }
            Err(err) => Err(WorkspaceError::Sqlx(err)),
        }
    }
}

/// Validate a workspace name.
///
/// - 3–63 characters
/// - lowercase letters, digits, dots, hyphens only
/// - cannot start/end with dot or hyphen
/// - cannot contain consecutive dots or dot-hyphen patterns
/// - cannot look like an IPv4 address
pub fn ensure_workspace_name_safe(name: &str) -> WorkspaceResult<()> {
    let invalid = |reason: &str| WorkspaceError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    let len = name.len();
    if !(WORKSPACE_NAME_MIN_LEN..=WORKSPACE_NAME_MAX_LEN).contains(&len) {
        return Err(invalid("must be between 3 and 63 characters"));
    }

    if !name
        .chars()
        .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '.' | '-'))
    {
        return Err(invalid(
            "allowed characters are lowercase letters, digits, dots, and hyphens",
        ));
    }

    if name.starts_with(['.', '-']) || name.ends_with(['.', '-']) {
        return Err(invalid("must start and end with a lowercase letter or digit"));
    }

    if name.contains("..") || name.contains("-.") || name.contains(".-") {
        return Err(invalid(
            "cannot contain consecutive dots or dot-hyphen combinations",
        ));
    }

    if is_ipv4_like(name) {
        return Err(invalid("must not be formatted like an IP address"));
    }

    Ok(())
}

/// Check if a string matches IPv4-like dotted decimal form.
fn is_ipv4_like(name: &str) -> bool {
    let parts: Vec<&str> = name.split('.').collect();
    parts.len() == 4
        && parts.iter().all(|segment| {
            !segment.is_empty()
                && segment.len() <= 3
                && segment.chars().all(|c| c.is_ascii_digit())
                && segment.parse::<u8>().is_ok()
        })
}
