//! Represents a workspace — the tenant boundary objects belong to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Connection settings for a workspace that brings its own object store.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct WorkspaceStorage {
    /// Bucket that holds the workspace's objects.
    pub bucket: String,

    /// S3-compatible endpoint URL.
    pub endpoint: String,

    /// Region name passed to the signer (e.g. "us-east-1").
    pub region: String,

    pub access_key: String,

    #[serde(skip_serializing)]
    pub secret_key: String,
}

/// A workspace and its storage mode.
///
/// `storage == None` means objects live on the gateway's local filesystem
/// under a directory named after the workspace.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Workspace {
    pub id: Uuid,
    pub name: String,
    pub storage: Option<WorkspaceStorage>,
    pub created_at: DateTime<Utc>,
}

impl Workspace {
    /// Whether object bytes are kept in the workspace's own external store.
    pub fn is_externally_backed(&self) -> bool {
        self.storage.is_some()
    }
}

/// Flat row shape of the `workspaces` table.
#[derive(FromRow, Debug)]
pub struct WorkspaceRow {
    pub id: Uuid,
    pub name: String,
    pub storage_bucket: Option<String>,
    pub storage_endpoint: Option<String>,
    pub storage_region: Option<String>,
    pub storage_access_key: Option<String>,
    pub storage_secret_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<WorkspaceRow> for Workspace {
    fn from(row: WorkspaceRow) -> Self {
        // A partially filled storage config is treated as absent.
        let storage = match (
            row.storage_bucket,
            row.storage_endpoint,
            row.storage_region,
            row.storage_access_key,
            row.storage_secret_key,
        ) {
            (Some(bucket), Some(endpoint), Some(region), Some(access_key), Some(secret_key)) => {
                Some(WorkspaceStorage {
                    bucket,
                    endpoint,
                    region,
                    access_key,
                    secret_key,
                })
            }
            _ => None,
        };

        Self {
            id: row.id,
            name: row.name,
            storage,
            created_at: row.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(bucket: Option<&str>) -> WorkspaceRow {
        WorkspaceRow {
            id: Uuid::new_v4(),
            name: "team-a".into(),
            storage_bucket: bucket.map(str::to_string),
            storage_endpoint: Some("http://localhost:9000".into()),
            storage_region: Some("us-east-1".into()),
            storage_access_key: Some("key".into()),
            storage_secret_key: Some("secret".into()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn complete_storage_columns_make_workspace_external() {
        let ws = Workspace::from(row(Some("team-a-objects")));
        assert!(ws.is_externally_backed());
        assert_eq!(ws.storage.unwrap().bucket, "team-a-objects");
    }

    #[test]
    fn missing_bucket_falls_back_to_local() {
        let ws = Workspace::from(row(None));
        assert!(!ws.is_externally_backed());
    }
}
