//! Core data models for the object gateway.
//!
//! Records map to SQLite tables via `sqlx::FromRow`; the `api` module holds
//! the JSON shapes exchanged with clients.

pub mod api;
pub mod object;
pub mod workspace;
