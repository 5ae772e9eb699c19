//! Represents a content-addressed object record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Metadata for a single content-addressed blob owned by a workspace.
///
/// The record never holds the bytes themselves. `external_id` names the
/// payload in physical storage, and `size` stays `0` until an upload has been
/// fully written and synced.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq, Eq)]
pub struct Object {
    /// Internal UUID for DB indexing.
    pub id: Uuid,

    /// Opaque identifier handed to clients and used as the storage key.
    pub external_id: String,

    /// Caller-supplied content digest; unique within a workspace.
    pub hash: String,

    /// Size in bytes.
    pub size: i64,

    /// Owning workspace.
    pub workspace_id: Uuid,

    /// When the record was first created.
    pub created_at: DateTime<Utc>,
}

/// One frame of an upload stream.
///
/// Only the first chunk's `hash` and `overwrite` are read; later chunks
/// contribute bytes only.
#[derive(Clone, Debug, Default)]
pub struct ObjectChunk {
    pub hash: String,
    pub overwrite: bool,
    pub content: bytes::Bytes,
}

impl ObjectChunk {
    /// Leading chunk of a stream, carrying the object's identity.
    pub fn first(hash: impl Into<String>, content: impl Into<bytes::Bytes>) -> Self {
        Self {
            hash: hash.into(),
            overwrite: false,
            content: content.into(),
        }
    }

    /// Continuation chunk: bytes only.
    pub fn data(content: impl Into<bytes::Bytes>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}
