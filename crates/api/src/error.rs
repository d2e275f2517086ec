//! Unified error handling.
//!
//! Provides a unified `ApiError` type mapped to the service's error
//! taxonomy. All route handlers return `Result<T, ApiError>`; the
//! `IntoResponse` impl builds the JSON failure body.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed request fields.
    #[error("validation error: {0}")]
    Validation(String),

    /// Missing, invalid, or revoked credentials.
    #[error("authentication error: {0}")]
    Authentication(String),

    /// Authenticated but insufficiently privileged.
    #[error("authorization error: {0}")]
    Authorization(String),

    /// Referenced entity absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// The fulfillment factory rejected the order or was unreachable.
    #[error("dependency error: {message}")]
    Dependency {
        message: String,
        report_url: Option<String>,
    },

    /// Persistence layer failure.
    #[error("storage error: {0}")]
    Storage(#[from] RepositoryError),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON failure body.
#[derive(Serialize)]
struct ErrorBody {
    message: String,
    #[serde(rename = "reportUrl", skip_serializing_if = "Option::is_none")]
    report_url: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Log server errors before responding
        if matches!(
            self,
            Self::Storage(_) | Self::Internal(_) | Self::Dependency { .. }
        ) {
            tracing::error!(error = %self, "Request error");
        }

        let status = match &self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Authentication(_) => StatusCode::UNAUTHORIZED,
            Self::Authorization(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Dependency { .. } | Self::Storage(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // Don't expose internal error details to clients
        let body = match self {
            Self::Storage(_) | Self::Internal(_) => ErrorBody {
                message: "internal server error".to_string(),
                report_url: None,
            },
            Self::Dependency {
                message,
                report_url,
            } => ErrorBody {
                message,
                report_url,
            },
            Self::Validation(message)
            | Self::Authentication(message)
            | Self::Authorization(message)
            | Self::NotFound(message) => ErrorBody {
                message,
                report_url: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<sliceworks_core::EmailError> for ApiError {
    fn from(e: sliceworks_core::EmailError) -> Self {
        Self::Validation(e.to_string())
    }
}

impl From<crate::services::session::SessionError> for ApiError {
    fn from(e: crate::services::session::SessionError) -> Self {
        use crate::services::session::SessionError;
        match e {
            SessionError::Signing(e) => Self::Internal(e.to_string()),
            SessionError::Repository(e) => Self::Storage(e),
        }
    }
}

impl From<crate::services::password::PasswordError> for ApiError {
    fn from(e: crate::services::password::PasswordError) -> Self {
        Self::Internal(e.to_string())
    }
}

/// Result type alias for `ApiError`.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_api_error_display() {
        let err = ApiError::NotFound("franchise 7".to_string());
        assert_eq!(err.to_string(), "not found: franchise 7");
    }

    #[test]
    fn test_api_error_status_codes() {
        assert_eq!(
            get_status(ApiError::Validation("bad".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(ApiError::Authentication("unauthorized".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(ApiError::Authorization("forbidden".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(ApiError::NotFound("gone".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(ApiError::Dependency {
                message: "factory down".to_string(),
                report_url: None,
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(ApiError::Internal("oops".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
