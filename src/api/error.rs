//! API Error Types
//!
//! Defines error types for the API layer and implements conversion
//! to HTTP responses with appropriate status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::ai::{ModelError, ToolError};
use crate::media::MediaError;
use crate::services::ServiceError;
use crate::store::StoreError;

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Resource already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Missing or invalid credentials
    #[error("Unauthorized")]
    Unauthorized,

    /// Authenticated but not allowed
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Document store failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Media store failure
    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Service unavailable (dependency down)
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(msg) => ApiError::Validation(msg),
            ServiceError::NotFound(what) => ApiError::NotFound(what),
            ServiceError::Conflict(msg) => ApiError::Conflict(msg),
            ServiceError::Unauthorized => ApiError::Unauthorized,
            ServiceError::Restricted => {
                ApiError::Forbidden("account is restricted".to_string())
            }
            ServiceError::Forbidden(msg) => ApiError::Forbidden(msg),
            ServiceError::Store(e) => ApiError::Store(e),
            ServiceError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<ToolError> for ApiError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::Model(ModelError::Api { status, message }) => {
                ApiError::Internal(format!("model API returned {}: {}", status, message))
            }
            ToolError::Model(e) => ApiError::ServiceUnavailable(e.to_string()),
            ToolError::Parse(msg) => ApiError::Internal(format!("unparseable model reply: {}", msg)),
        }
    }
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
    pub request_id: String,
}

/// Error details
#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR"),
            ApiError::Media(e) => match e {
                MediaError::NotFound(_) => (StatusCode::NOT_FOUND, "MEDIA_NOT_FOUND"),
                MediaError::UnsupportedType(_) => {
                    (StatusCode::UNSUPPORTED_MEDIA_TYPE, "UNSUPPORTED_MEDIA_TYPE")
                }
                MediaError::TooLarge { .. } => {
                    (StatusCode::PAYLOAD_TOO_LARGE, "MEDIA_TOO_LARGE")
                }
                MediaError::InvalidId(_) => (StatusCode::BAD_REQUEST, "INVALID_MEDIA_ID"),
                MediaError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "MEDIA_IO_ERROR"),
            },
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
            }
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
        };

        let request_id = uuid::Uuid::new_v4().to_string();

        // Log the error
        tracing::error!(
            request_id = %request_id,
            error_code = %code,
            error_message = %self,
            "API error occurred"
        );

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: self.to_string(),
            },
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_mapping() {
        let api: ApiError = ServiceError::Unauthorized.into();
        assert!(matches!(api, ApiError::Unauthorized));

        let api: ApiError = ServiceError::Restricted.into();
        assert!(matches!(api, ApiError::Forbidden(_)));

        let api: ApiError = ServiceError::Conflict("taken".to_string()).into();
        assert!(matches!(api, ApiError::Conflict(_)));
    }

    #[test]
    fn test_model_error_maps_to_unavailable() {
        let api: ApiError = ToolError::Model(ModelError::Unavailable).into();
        assert!(matches!(api, ApiError::ServiceUnavailable(_)));
    }
}
