//! Content-addressed object gateway.
//!
//! Resolves whether an object exists for a workspace, negotiates record
//! creation (with presigned direct-upload URLs for workspaces that bring
//! their own storage), and ingests streamed uploads into gateway-managed
//! storage with all-or-nothing cleanup.

pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::Router;

/// The full application router with state attached.
pub fn app(state: state::AppState) -> Router {
    routes::routes::routes().with_state(state)
}
