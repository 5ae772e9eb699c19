//! Caller-facing failures of the object protocol.
//!
//! `Display` is the message returned to clients; the source chain carries the
//! detail that goes to the logs.

use crate::services::{
    backend::BackendError, external_store::ExternalStoreError, object_repository::RepositoryError,
};
use axum::http::StatusCode;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObjectError {
    #[error("Unable to look up object")]
    Lookup(#[source] RepositoryError),
    #[error("Unable to create storage client")]
    StorageClient(#[source] ExternalStoreError),
    #[error("Unable to check if object exists")]
    ExistenceCheck(#[source] BackendError),
    #[error("Unable to prepare object directory")]
    PrepareDirectory(#[source] io::Error),
    #[error("Unable to create object")]
    Create(#[source] RepositoryError),
    #[error("Object already exists")]
    AlreadyExists { hash: String },
    #[error("Unable to generate presigned URL")]
    Presign(#[source] ExternalStoreError),
    #[error("No content received")]
    EmptyStream,
    #[error("Missing content hash")]
    MissingHash,
    #[error("Unable to receive stream of bytes")]
    Receive(#[source] io::Error),
    #[error("Unable to create file")]
    CreateFile(#[source] io::Error),
    #[error("Unable to write file content")]
    Write(#[source] io::Error),
    #[error("Unable to sync file content")]
    Sync(#[source] io::Error),
    #[error("Unable to complete file upload")]
    Finalize(#[source] RepositoryError),
}

impl ObjectError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ObjectError::EmptyStream | ObjectError::MissingHash | ObjectError::Receive(_) => {
                StatusCode::BAD_REQUEST
            }
            ObjectError::AlreadyExists { .. } => StatusCode::CONFLICT,
            ObjectError::StorageClient(_) | ObjectError::Presign(_) => StatusCode::BAD_GATEWAY,
            ObjectError::ExistenceCheck(BackendError::External(_)) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type ObjectResult<T> = Result<T, ObjectError>;
