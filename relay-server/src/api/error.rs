//! API Error Handling
//!
//! Unified error types and conversion for API responses.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use relay_client::OrchestrationError;

use crate::service::dispatch_service::DispatchError;
use crate::service::document_service::DocumentError;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    UnsupportedMediaType(String),
    Orchestration(OrchestrationError),
    InternalError(String),
}

impl ApiError {
    fn parts(self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            ApiError::UnsupportedMediaType(msg) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "unsupported_media_type",
                msg,
            ),
            ApiError::Orchestration(err) => {
                tracing::error!("Orchestration failed: {}", err);
                let (status, kind) = match &err {
                    OrchestrationError::Launch(_) => (StatusCode::BAD_GATEWAY, "launch_failed"),
                    OrchestrationError::StatusFetch(_) => {
                        (StatusCode::BAD_GATEWAY, "status_fetch_failed")
                    }
                    OrchestrationError::RunFailed { .. } => (StatusCode::BAD_GATEWAY, "run_failed"),
                    OrchestrationError::PollTimeout { .. } => {
                        (StatusCode::GATEWAY_TIMEOUT, "poll_timeout")
                    }
                    OrchestrationError::Cancelled { .. } => {
                        (StatusCode::SERVICE_UNAVAILABLE, "cancelled")
                    }
                };
                (status, kind, err.to_string())
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal", msg)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = self.parts();

        (
            status,
            Json(serde_json::json!({ "error": message, "kind": kind })),
        )
            .into_response()
    }
}

impl From<DocumentError> for ApiError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::NotFound(id) => ApiError::NotFound(format!("Document {} not found", id)),
            DocumentError::RouteNotFound { method, path } => {
                ApiError::NotFound(format!("Route {} {} not found", method, path))
            }
            DocumentError::UnsupportedMediaType(content_type) => ApiError::UnsupportedMediaType(
                format!("Unsupported content type '{}'", content_type),
            ),
            DocumentError::ValidationError(msg) => ApiError::BadRequest(msg),
            DocumentError::SerializationError(err) => {
                ApiError::InternalError(format!("Cache entry could not be (de)serialized: {}", err))
            }
        }
    }
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::Document(err) => err.into(),
            DispatchError::ValidationError(msg) => ApiError::BadRequest(msg),
            DispatchError::Orchestration(err) => ApiError::Orchestration(err),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::MissingJsonContentType(_) => {
                ApiError::UnsupportedMediaType(rejection.body_text())
            }
            _ => ApiError::BadRequest(rejection.body_text()),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
