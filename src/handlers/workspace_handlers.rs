//! Workspace registration.

use crate::{
    errors::AppError,
    models::api::{CreateWorkspaceRequest, WorkspaceResponse},
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

/// PUT `/workspaces/{workspace}` — register a workspace, optionally with its
/// own external storage.
pub async fn create_workspace(
    State(state): State<AppState>,
    Path(name): Path<String>,
    payload: Option<Json<CreateWorkspaceRequest>>,
) -> Result<(StatusCode, Json<WorkspaceResponse>), AppError> {
    let storage = payload.and_then(|Json(req)| req.storage);
    let workspace = state.workspaces.create(&name, storage).await?;
    tracing::info!(
        workspace = %workspace.name,
        external = workspace.is_externally_backed(),
        "workspace created"
    );

    Ok((
        StatusCode::CREATED,
        Json(WorkspaceResponse {
            id: workspace.id,
            use_workspace_storage: workspace.is_externally_backed(),
            name: workspace.name,
        }),
    ))
}
