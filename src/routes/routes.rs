//! Routes of the object gateway.
//!
//! ## Structure
//! - **Probes**
//!   - `GET  /healthz`, `GET /readyz`
//!
//! - **Workspaces**
//!   - `PUT  /workspaces/{workspace}` — register a workspace
//!
//! - **Objects** (scoped to a workspace)
//!   - `GET  /workspaces/{workspace}/objects/{hash}` — existence check
//!   - `POST /workspaces/{workspace}/objects` — create or reuse a record
//!   - `PUT  /workspaces/{workspace}/objects/{hash}/stream` — streaming upload

use crate::{
    handlers::{
        health_handlers::{healthz, readyz},
        object_handlers::{create_object, head_object, put_object_stream},
        workspace_handlers::create_workspace,
    },
    state::AppState,
};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Build the router; handlers share `AppState`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/workspaces/{workspace}", put(create_workspace))
        .route("/workspaces/{workspace}/objects", post(create_object))
        .route("/workspaces/{workspace}/objects/{hash}", get(head_object))
        .route(
            "/workspaces/{workspace}/objects/{hash}/stream",
            put(put_object_stream),
        )
}
