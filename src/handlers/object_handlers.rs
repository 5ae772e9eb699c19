//! HTTP handlers for the object protocol.
//! Upload bodies are streamed frame by frame into the ingestion engine; no
//! request body is buffered in memory.

use crate::{
    errors::AppError,
    models::{
        api::{
            CreateObjectRequest, CreateObjectResponse, HeadObjectResponse, PutObjectResponse,
            PutObjectStreamQuery,
        },
        object::ObjectChunk,
        workspace::Workspace,
    },
    state::AppState,
};
use axum::{
    Json,
    body::Body,
    extract::{Path, Query, State},
    http::StatusCode,
};
use futures::StreamExt;
use std::io;
use tracing::info;

/// Look up the workspace a request is scoped to.
pub(crate) async fn load_workspace(state: &AppState, name: &str) -> Result<Workspace, AppError> {
    state
        .workspaces
        .get_by_name(name)
        .await?
        .ok_or_else(|| AppError::not_found(format!("workspace `{}` not found", name)))
}

/// GET `/workspaces/{workspace}/objects/{hash}` — does the object exist?
pub async fn head_object(
    State(state): State<AppState>,
    Path((workspace, hash)): Path<(String, String)>,
) -> Result<(StatusCode, Json<HeadObjectResponse>), AppError> {
    let workspace = load_workspace(&state, &workspace).await?;

    let response: (StatusCode, Json<HeadObjectResponse>) = match state
        .objects
        .resolve_existence(&hash, &workspace)
        .await
    {
        Ok(report) => (StatusCode::OK, Json(report.into())),
        Err(err) => (
            err.status_code(),
            Json(HeadObjectResponse::failed(
                &err,
                workspace.is_externally_backed(),
            )),
        ),
    };
    Ok(response)
}

/// POST `/workspaces/{workspace}/objects` — create or reuse a record.
pub async fn create_object(
    State(state): State<AppState>,
    Path(workspace): Path<String>,
    Json(req): Json<CreateObjectRequest>,
) -> Result<(StatusCode, Json<CreateObjectResponse>), AppError> {
    let workspace = load_workspace(&state, &workspace).await?;

    let response: (StatusCode, Json<CreateObjectResponse>) = match state
        .objects
        .create_or_reuse(&req.hash, req.size, req.overwrite, &workspace)
        .await
    {
        Ok(created) => (StatusCode::OK, Json(created.into())),
        Err(err) => (err.status_code(), Json((&err).into())),
    };
    Ok(response)
}

/// PUT `/workspaces/{workspace}/objects/{hash}/stream` — stream the body to
/// gateway storage.
///
/// Each body frame becomes one chunk; the path hash and `overwrite` flag are
/// attached to the first.
pub async fn put_object_stream(
    State(state): State<AppState>,
    Path((workspace, hash)): Path<(String, String)>,
    Query(query): Query<PutObjectStreamQuery>,
    body: Body,
) -> Result<(StatusCode, Json<PutObjectResponse>), AppError> {
    let workspace = load_workspace(&state, &workspace).await?;
    info!(workspace = %workspace.name, hash = %hash, "PutObjectStream: starting");

    let overwrite = query.overwrite;
    let chunks = body
        .into_data_stream()
        .enumerate()
        .map(move |(index, frame)| -> io::Result<ObjectChunk> {
            let content = frame.map_err(io::Error::other)?;
            Ok(if index == 0 {
                ObjectChunk::first(hash.clone(), content).with_overwrite(overwrite)
            } else {
                ObjectChunk::data(content)
            })
        });

    let response: (StatusCode, Json<PutObjectResponse>) =
        match state.objects.ingest_stream(&workspace, chunks).await {
            Ok(ingested) => (StatusCode::OK, Json(ingested.into())),
            Err(err) => (err.status_code(), Json((&err).into())),
        };
    Ok(response)
}
