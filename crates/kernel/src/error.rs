//! Application error types.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::store::StoreError;

/// Application errors.
///
/// Each variant maps to one stable HTTP status; the JSON body always carries a
/// human-readable `message` and, for field-level failures, the offending `field`.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required field is missing or malformed.
    #[error("{message}")]
    ValidationFailed { field: &'static str, message: String },

    /// Request body is not valid JSON for the endpoint.
    #[error("{0}")]
    MalformedBody(String),

    /// Credential missing, malformed, expired or unknown.
    #[error("{0}")]
    Unauthenticated(String),

    /// Valid identity without rights over the target entity.
    #[error("{0}")]
    Unauthorized(String),

    /// Request origin not in the site's allow-list.
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// Uniqueness violation on a stored field.
    #[error("{message}")]
    Conflict { field: String, message: String },

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Shorthand for a missing required field.
    pub fn missing(field: &'static str) -> Self {
        Self::ValidationFailed {
            field,
            message: format!("{field} is required"),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationFailed { .. } | AppError::MalformedBody(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthenticated(_) | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation { field } => {
                let message = match field.as_str() {
                    "slug" => {
                        "A blog with this title already exists. Please use a different title."
                            .to_string()
                    }
                    "siteId" => "This site ID is already taken".to_string(),
                    "email" => "An account with this email already exists".to_string(),
                    other => format!("{other} must be unique"),
                };
                AppError::Conflict { field, message }
            }
            StoreError::Backend(e) => AppError::Internal(e),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::MalformedBody(rejection.body_text())
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            AppError::Internal(e) => {
                tracing::error!(error = %e, "internal server error");
                ErrorResponse {
                    message: "internal server error".to_string(),
                    field: None,
                }
            }
            AppError::ValidationFailed { field, message } => ErrorResponse {
                message: message.clone(),
                field: Some((*field).to_string()),
            },
            AppError::Conflict { field, message } => ErrorResponse {
                message: message.clone(),
                field: Some(field.clone()),
            },
            _ => ErrorResponse {
                message: self.to_string(),
                field: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias using AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(AppError::missing("title").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::MalformedBody("expected a boolean".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Unauthenticated("no token".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Unauthorized("not yours".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Forbidden("origin".into()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::NotFound("Blog not found".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn unique_violation_becomes_conflict_naming_field() {
        let err: AppError = StoreError::UniqueViolation {
            field: "slug".to_string(),
        }
        .into();

        match err {
            AppError::Conflict { field, message } => {
                assert_eq!(field, "slug");
                assert!(message.contains("title already exists"));
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn backend_failure_becomes_internal() {
        let err: AppError = StoreError::Backend(anyhow::anyhow!("connection reset")).into();
        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(err.to_string(), "internal server error");
    }
}
