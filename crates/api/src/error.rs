//! API error types with HTTP response mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use shop::{FieldError, ShopError, ValidationErrors};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed or missing input.
    Validation(ValidationErrors),
    /// Resource not found.
    NotFound(String),
    /// Missing, invalid or expired token, or bad credentials.
    Unauthorized(String),
    /// Authenticated but not allowed.
    Forbidden,
    /// Duplicate unique key.
    Conflict(String),
    /// Internal server error. The message is logged, never returned.
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<&'a [FieldError]>,
}

impl ApiError {
    /// A validation error on a single field.
    pub fn invalid(field: &str, message: &str) -> Self {
        ApiError::Validation(ValidationErrors::single(field, message))
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_error",
            ApiError::NotFound(_) => "not_found",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden => "forbidden",
            ApiError::Conflict(_) => "conflict",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = self.kind();
        let body = match &self {
            ApiError::Validation(errors) => ErrorBody {
                error,
                message: "Validation failed".to_string(),
                fields: Some(errors.errors()),
            },
            ApiError::NotFound(msg) | ApiError::Unauthorized(msg) | ApiError::Conflict(msg) => {
                ErrorBody {
                    error,
                    message: msg.clone(),
                    fields: None,
                }
            }
            ApiError::Forbidden => ErrorBody {
                error,
                message: "Forbidden".to_string(),
                fields: None,
            },
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                ErrorBody {
                    error,
                    message: "Internal server error".to_string(),
                    fields: None,
                }
            }
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<ShopError> for ApiError {
    fn from(err: ShopError) -> Self {
        match err {
            ShopError::Validation(errors) => ApiError::Validation(errors),
            ShopError::NotFound(msg) => ApiError::NotFound(msg),
            ShopError::Unauthorized(msg) => ApiError::Unauthorized(msg),
            ShopError::Forbidden => ApiError::Forbidden,
            ShopError::Conflict(msg) => ApiError::Conflict(msg),
            other @ (ShopError::Store(_)
            | ShopError::Token(_)
            | ShopError::PasswordHash(_)
            | ShopError::Upload(_)) => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid("body", &rejection.body_text())
    }
}
