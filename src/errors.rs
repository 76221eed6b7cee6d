use crate::services::{file_repository::RepositoryError, file_service::FileServiceError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;
use tracing::{error, warn};

/// A lightweight wrapper for general errors that keeps the message local.
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

    /// Shortcut for 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
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
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

impl From<FileServiceError> for AppError {
    fn from(err: FileServiceError) -> Self {
        match err {
            FileServiceError::FileNameRequired | FileServiceError::InvalidKey => {
                AppError::bad_request(err.to_string())
            }
            FileServiceError::Repository(err) => err.into(),
        }
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::InvalidKey(_) => AppError::bad_request("Empty or invalid key"),
            RepositoryError::NotFound(_) => AppError::not_found(err.to_string()),
            RepositoryError::AccessExpired {
                ref key,
                expired_at,
            } => {
                warn!(key = %key, %expired_at, "refused download of expired file");
                AppError::new(StatusCode::FORBIDDEN, err.to_string())
            }
            RepositoryError::InvalidExpiry { ref key, ref reason } => {
                error!(key = %key, reason = %reason, "stored expiry unreadable");
                AppError::internal("stored file metadata is corrupt")
            }
            RepositoryError::ExpiryOutOfRange { ttl } => {
                error!(%ttl, "access token expiry cannot be computed");
                AppError::internal("access token lifetime misconfigured")
            }
            RepositoryError::Tagging { .. } | RepositoryError::Store(_) => {
                error!(error = %err, "storage backend failure");
                AppError::new(StatusCode::BAD_GATEWAY, "storage backend error")
            }
        }
    }
}
