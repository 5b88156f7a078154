use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::pipeline::PipelineError;

/// HTTP-facing error for route handlers. Wraps the pipeline taxonomy and
/// adds request-level variants; `IntoResponse` yields a consistent JSON
/// error body.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0} not found")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("upstream failure: {0}")]
    Upstream(String),

    #[error("service unavailable: {0}")]
    Unavailable(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Pipeline(p) => match p {
                PipelineError::NotFound { .. } => {
                    (StatusCode::NOT_FOUND, "NOT_FOUND", p.to_string())
                }
                PipelineError::Precondition(_) => {
                    (StatusCode::BAD_REQUEST, "PRECONDITION_FAILED", p.to_string())
                }
                PipelineError::ExternalTool { .. } => (
                    StatusCode::BAD_GATEWAY,
                    "EXTERNAL_TOOL_FAILURE",
                    p.to_string(),
                ),
                PipelineError::Storage(e) => {
                    tracing::error!(error = %e, "pipeline storage failure");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "STORAGE_FAILURE",
                        "storage operation failed".to_string(),
                    )
                }
                PipelineError::Io(_) | PipelineError::Encode(_) | PipelineError::Join(_) => {
                    tracing::error!(error = %p, "pipeline internal failure");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "internal pipeline failure".to_string(),
                    )
                }
            },
            ApiError::Database(e) => {
                tracing::error!(error = %e, "database failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_FAILURE",
                    "database operation failed".to_string(),
                )
            }
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", self.to_string()),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", self.to_string()),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT", self.to_string()),
            ApiError::Upstream(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_FAILURE", self.to_string()),
            ApiError::Unavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "UNAVAILABLE",
                self.to_string(),
            ),
        };

        let body = Json(json!({ "error": { "code": code, "message": message } }));
        (status, body).into_response()
    }
}
