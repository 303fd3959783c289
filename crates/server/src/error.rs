//! Domain-to-HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

use courier_domain::DomainError;

use crate::dto::ValidationError;

/// Error envelope returned by every failing endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

pub const CODE_NOT_FOUND: &str = "not_found";
pub const CODE_CONFLICT: &str = "conflict";
pub const CODE_VALIDATION: &str = "validation_error";
pub const CODE_DUPLICATE_REQUEST: &str = "duplicate_request";
pub const CODE_INTERNAL: &str = "internal_server_error";

/// Handler error: a domain failure or a request-level validation failure.
#[derive(Debug)]
pub enum ApiError {
    Domain(DomainError),
    Validation(Vec<ValidationError>),
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl ApiError {
    fn parts(self) -> (StatusCode, &'static str, String, Option<serde_json::Value>) {
        match self {
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                CODE_VALIDATION,
                "validation failed".to_string(),
                Some(json!({ "validation_errors": errors })),
            ),
            ApiError::Domain(err) => match err {
                DomainError::NotFound => (
                    StatusCode::NOT_FOUND,
                    CODE_NOT_FOUND,
                    "notification or batch not found".to_string(),
                    None,
                ),
                DomainError::InvalidChannel { .. } => (
                    StatusCode::BAD_REQUEST,
                    CODE_VALIDATION,
                    "invalid channel: must be sms, email, or push".to_string(),
                    None,
                ),
                DomainError::InvalidPriority { .. } => (
                    StatusCode::BAD_REQUEST,
                    CODE_VALIDATION,
                    "invalid priority: must be high, normal, or low".to_string(),
                    None,
                ),
                DomainError::InvalidContent { .. } => (
                    StatusCode::BAD_REQUEST,
                    CODE_VALIDATION,
                    "invalid content: check character limits and required fields".to_string(),
                    None,
                ),
                DomainError::DuplicateRequest => (
                    StatusCode::CONFLICT,
                    CODE_DUPLICATE_REQUEST,
                    "duplicate request: idempotency key already used".to_string(),
                    None,
                ),
                DomainError::BatchTooLarge { .. } => (
                    StatusCode::BAD_REQUEST,
                    CODE_VALIDATION,
                    "batch size exceeds maximum".to_string(),
                    Some(json!({ "max_size": courier_domain::notification::rules::MAX_BATCH_SIZE })),
                ),
                DomainError::AlreadyTerminal => (
                    StatusCode::CONFLICT,
                    CODE_CONFLICT,
                    "notification already in terminal state".to_string(),
                    None,
                ),
                DomainError::RateLimited { .. } | DomainError::InfrastructureError { .. } => {
                    tracing::error!(error = %err, "internal server error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        CODE_INTERNAL,
                        "internal server error".to_string(),
                        None,
                    )
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = self.parts();
        let body = ErrorResponse {
            success: false,
            error: ErrorDetail {
                code,
                message,
                details,
            },
            timestamp: Utc::now(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_error_kind() {
        let cases = [
            (DomainError::NotFound, StatusCode::NOT_FOUND, CODE_NOT_FOUND),
            (
                DomainError::InvalidChannel { value: "x".into() },
                StatusCode::BAD_REQUEST,
                CODE_VALIDATION,
            ),
            (
                DomainError::InvalidPriority { value: "x".into() },
                StatusCode::BAD_REQUEST,
                CODE_VALIDATION,
            ),
            (
                DomainError::InvalidContent { reason: "r".into() },
                StatusCode::BAD_REQUEST,
                CODE_VALIDATION,
            ),
            (
                DomainError::DuplicateRequest,
                StatusCode::CONFLICT,
                CODE_DUPLICATE_REQUEST,
            ),
            (
                DomainError::AlreadyTerminal,
                StatusCode::CONFLICT,
                CODE_CONFLICT,
            ),
            (
                DomainError::infrastructure("boom"),
                StatusCode::INTERNAL_SERVER_ERROR,
                CODE_INTERNAL,
            ),
            (
                DomainError::RateLimited {
                    channel: courier_domain::Channel::Sms,
                },
                StatusCode::INTERNAL_SERVER_ERROR,
                CODE_INTERNAL,
            ),
        ];

        for (err, expected_status, expected_code) in cases {
            let (status, code, _, _) = ApiError::Domain(err).parts();
            assert_eq!(status, expected_status);
            assert_eq!(code, expected_code);
        }
    }

    #[test]
    fn batch_too_large_carries_max_size() {
        let (status, code, _, details) =
            ApiError::Domain(DomainError::BatchTooLarge { size: 1001 }).parts();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, CODE_VALIDATION);
        assert_eq!(details.unwrap()["max_size"], 1000);
    }
}
