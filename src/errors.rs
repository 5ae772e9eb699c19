use crate::services::workspace_repository::WorkspaceError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// HTTP-layer failure outside the object protocol itself (unknown workspace,
/// invalid workspace registration, database trouble while resolving them).
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "ok": false,
            "error_msg": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

impl From<WorkspaceError> for AppError {
    fn from(err: WorkspaceError) -> Self {
        match err {
            WorkspaceError::InvalidName { .. } => {
                AppError::new(StatusCode::BAD_REQUEST, err.to_string())
            }
            WorkspaceError::AlreadyExists(_) => AppError::new(StatusCode::CONFLICT, err.to_string()),
            WorkspaceError::Sqlx(inner) => {
                tracing::error!(error = %inner, "workspace query failed");
                AppError::internal("Unable to resolve workspace")
            }
        }
    }
}
