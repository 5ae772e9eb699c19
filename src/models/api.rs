//! Request and response bodies of the HTTP API.
//!
//! Every object response carries `ok`; failures set `ok = false` and a
//! human-readable `error_msg` instead of the success fields.

use crate::models::workspace::WorkspaceStorage;
use crate::services::{
    error::ObjectError,
    ingest::IngestedObject,
    object_service::{CreatedObject, ExistenceReport},
};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ObjectMetadata {
    /// Content hash of the object.
    pub name: String,
    pub size: i64,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct HeadObjectResponse {
    pub ok: bool,
    pub exists: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_metadata: Option<ObjectMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    pub use_workspace_storage: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_msg: Option<String>,
}

impl From<ExistenceReport> for HeadObjectResponse {
    fn from(report: ExistenceReport) -> Self {
        let use_workspace_storage = report.use_workspace_storage;
        match report.object {
            Some(object) => Self {
                ok: true,
                exists: true,
                object_metadata: Some(ObjectMetadata {
                    name: object.hash,
                    size: object.size,
                }),
                object_id: Some(object.external_id),
                use_workspace_storage,
                error_msg: None,
            },
            None => Self {
                ok: true,
                use_workspace_storage,
                ..Self::default()
            },
        }
    }
}

impl HeadObjectResponse {
    pub fn failed(err: &ObjectError, use_workspace_storage: bool) -> Self {
        Self {
            use_workspace_storage,
            error_msg: Some(err.to_string()),
            ..Self::default()
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CreateObjectRequest {
    pub hash: String,
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub overwrite: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct CreateObjectResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presigned_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_msg: Option<String>,
}

impl From<CreatedObject> for CreateObjectResponse {
    fn from(created: CreatedObject) -> Self {
        Self {
            ok: true,
            object_id: Some(created.object_id),
            presigned_url: created.upload_url,
            error_msg: None,
        }
    }
}

impl From<&ObjectError> for CreateObjectResponse {
    fn from(err: &ObjectError) -> Self {
        Self {
            error_msg: Some(err.to_string()),
            ..Self::default()
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct PutObjectResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_msg: Option<String>,
}

impl From<IngestedObject> for PutObjectResponse {
    fn from(ingested: IngestedObject) -> Self {
        Self {
            ok: true,
            object_id: Some(ingested.object_id),
            size: Some(ingested.size),
            error_msg: None,
        }
    }
}

impl From<&ObjectError> for PutObjectResponse {
    fn from(err: &ObjectError) -> Self {
        Self {
            error_msg: Some(err.to_string()),
            ..Self::default()
        }
    }
}

/// Query string of the streaming upload endpoint.
#[derive(Deserialize, Debug, Default)]
pub struct PutObjectStreamQuery {
    #[serde(default)]
    pub overwrite: bool,
}

/// Body of `PUT /workspaces/{workspace}`.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct CreateWorkspaceRequest {
    #[serde(default)]
    pub storage: Option<WorkspaceStorage>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct WorkspaceResponse {
    pub id: uuid::Uuid,
    pub name: String,
    pub use_workspace_storage: bool,
}
