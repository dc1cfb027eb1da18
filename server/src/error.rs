//! HTTP error type.
//!
//! Bridges the domain taxonomy to HTTP responses. Every error leaves the
//! service as `{"code": "...", "message": "..."}` with a stable
//! machine-readable code, one shape for every route.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use gatherly_core::DomainError;
use serde::Serialize;
use std::fmt;

/// Application error type for HTTP handlers.
///
/// Implements Axum's `IntoResponse`, so handlers can return
/// `Result<_, ApiError>` and use `?` throughout.
#[derive(Debug)]
pub struct ApiError {
    /// HTTP status code.
    status: StatusCode,
    /// User-facing message.
    message: String,
    /// Stable code for client error handling.
    code: &'static str,
    /// Internal error, logged but never exposed.
    source: Option<anyhow::Error>,
}

impl ApiError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: &'static str) -> Self {
        Self {
            status,
            message,
            code,
            source: None,
        }
    }

    /// Attach a source error for logging.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message.into(), "BAD_REQUEST")
    }

    /// Create a 401 Unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message.into(), "UNAUTHORIZED")
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message.into(),
            "INTERNAL_SERVER_ERROR",
        )
    }

    /// The response status (visible for tests).
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// The stable error code (visible for tests).
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let message = err.to_string();
        match err {
            DomainError::Validation(_) => {
                Self::new(StatusCode::BAD_REQUEST, message, "VALIDATION_ERROR")
            }
            DomainError::NotFound { .. } => {
                Self::new(StatusCode::NOT_FOUND, message, "NOT_FOUND")
            }
            DomainError::Forbidden(_) => Self::new(StatusCode::FORBIDDEN, message, "FORBIDDEN"),
            DomainError::AlreadyJoined => {
                Self::new(StatusCode::BAD_REQUEST, message, "ALREADY_JOINED")
            }
            DomainError::CapacityExceeded => {
                Self::new(StatusCode::BAD_REQUEST, message, "EVENT_FULL")
            }
            DomainError::EventCompleted => {
                Self::new(StatusCode::BAD_REQUEST, message, "EVENT_COMPLETED")
            }
            DomainError::DuplicateReference => {
                Self::new(StatusCode::BAD_REQUEST, message, "DUPLICATE_REFERENCE")
            }
            DomainError::PaymentNotVerified(_) => {
                Self::new(StatusCode::BAD_REQUEST, message, "PAYMENT_NOT_VERIFIED")
            }
            DomainError::Gateway(source) => Self::new(
                StatusCode::BAD_GATEWAY,
                "payment gateway error".to_string(),
                "GATEWAY_ERROR",
            )
            .with_source(source.into()),
            DomainError::EmailTaken => Self::new(StatusCode::CONFLICT, message, "EMAIL_TAKEN"),
            DomainError::InvalidCredentials => {
                Self::new(StatusCode::UNAUTHORIZED, message, "INVALID_CREDENTIALS")
            }
            DomainError::Storage(detail) => Self::internal("An internal error occurred")
                .with_source(anyhow::anyhow!(detail)),
        }
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Stable error code.
    code: &'static str,
    /// Human-readable message.
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    error = %source,
                    "Request failed"
                );
            } else {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    "Request failed"
                );
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatherly_core::payment::GatewayError;

    #[test]
    fn domain_errors_map_to_stable_codes() {
        let cases: [(DomainError, StatusCode, &str); 6] = [
            (
                DomainError::AlreadyJoined,
                StatusCode::BAD_REQUEST,
                "ALREADY_JOINED",
            ),
            (
                DomainError::CapacityExceeded,
                StatusCode::BAD_REQUEST,
                "EVENT_FULL",
            ),
            (
                DomainError::DuplicateReference,
                StatusCode::BAD_REQUEST,
                "DUPLICATE_REFERENCE",
            ),
            (
                DomainError::not_found("event", "x"),
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
            ),
            (
                DomainError::Gateway(GatewayError::Status(503)),
                StatusCode::BAD_GATEWAY,
                "GATEWAY_ERROR",
            ),
            (DomainError::EmailTaken, StatusCode::CONFLICT, "EMAIL_TAKEN"),
        ];
        for (err, status, code) in cases {
            let api: ApiError = err.into();
            assert_eq!(api.status(), status);
            assert_eq!(api.code(), code);
        }
    }

    #[test]
    fn storage_details_stay_internal() {
        let api: ApiError = DomainError::Storage("connection refused".into()).into();
        assert_eq!(api.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.to_string().contains("connection refused"));
    }
}
