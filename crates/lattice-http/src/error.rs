//! Mapping from graph errors to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lattice::error::Error;
use serde::Serialize;
use thiserror::Error;

/// Error returned by every handler.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The graph service rejected or failed the call.
    #[error(transparent)]
    Graph(#[from] Error),

    /// The kind segment is valid but not served by this method
    /// (`POST .../parent/...`, `PUT .../blocks/...`).
    #[error("Relation kind '{0}' is not available on this route")]
    KindNotRoutable(String),
}

/// Body of every error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

impl ApiError {
    /// Status code for this error. Each variant maps to exactly one code.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Graph(err) => match err {
                Error::IssueNotFound(_) | Error::UnknownRelationKind(_) => StatusCode::NOT_FOUND,
                Error::SelfRelation { .. }
                | Error::RelationNotFound { .. }
                | Error::Validation(_) => StatusCode::BAD_REQUEST,
                Error::PermissionDenied { .. } => StatusCode::FORBIDDEN,
                Error::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                Error::Config(_) | Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::KindNotRoutable(_) => StatusCode::NOT_FOUND,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Graph(err) => match err {
                Error::IssueNotFound(_) => "issue_not_found",
                Error::SelfRelation { .. } => "self_relation",
                Error::RelationNotFound { .. } => "relation_not_found",
                Error::PermissionDenied { .. } => "permission_denied",
                Error::StorageUnavailable(_) => "storage_unavailable",
                Error::UnknownRelationKind(_) => "unknown_relation_kind",
                Error::Validation(_) => "validation_failed",
                Error::Config(_) => "config_error",
                Error::Io(_) => "internal_error",
            },
            ApiError::KindNotRoutable(_) => "unknown_relation_kind",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "Request failed");
        } else {
            tracing::debug!(code = self.code(), error = %self, "Request rejected");
        }

        let body = ErrorBody {
            error: self.to_string(),
            code: self.code(),
        };
        (status, Json(body)).into_response()
    }
}
