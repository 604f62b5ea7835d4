//! Error taxonomy and HTTP response mapping.
//!
//! Every failure the orchestrators can produce is converted into an
//! [`AppError`] and rendered as a structured JSON response at the handler
//! boundary. Nothing escapes to the transport layer as a raw fault, and
//! unexpected failures never leak internal detail to the caller (they are
//! logged with full context instead).
//!
//! # Usage
//!
//! ```ignore
//! use portcullis::error::AppError;
//!
//! async fn handler() -> Result<String, AppError> {
//!     let record = load_record()
//!         .map_err(|e| AppError::unexpected(format!("record load failed: {e}")))?;
//!     Ok(record)
//! }
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::fmt;

use crate::schema::FieldViolation;

// ============================================================================
// Error Kinds
// ============================================================================

/// Error categories with fixed HTTP status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// One or more request fields violated the declared schema (400).
    Validation,
    /// Bad credentials at login; the cause is never distinguished (401).
    Authentication,
    /// Missing, malformed, or expired bearer token (401).
    Authorization,
    /// Duplicate registration (409).
    Conflict,
    /// Anything else: downstream store failure, serialization bug (500).
    Unexpected,
}

impl ErrorKind {
    /// HTTP status code for this error kind.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::Authentication => StatusCode::UNAUTHORIZED,
            Self::Authorization => StatusCode::UNAUTHORIZED,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Unexpected => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation_error"),
            Self::Authentication => write!(f, "authentication_error"),
            Self::Authorization => write!(f, "authorization_error"),
            Self::Conflict => write!(f, "conflict"),
            Self::Unexpected => write!(f, "unexpected_error"),
        }
    }
}

// ============================================================================
// Application Error
// ============================================================================

/// Application error carried through the orchestrators.
///
/// The `message` is always safe to expose. Internal detail lives in
/// `details` and is only ever logged.
#[derive(Debug)]
pub struct AppError {
    /// Category; determines the response status code.
    pub kind: ErrorKind,
    /// User-facing message.
    pub message: String,
    /// Field-level violations (validation errors only).
    pub errors: Vec<FieldViolation>,
    /// Internal detail (logged, never exposed).
    pub details: Option<String>,
}

impl AppError {
    /// Validation failure listing every violated field (400).
    pub fn validation(errors: Vec<FieldViolation>) -> Self {
        Self {
            kind: ErrorKind::Validation,
            message: "Validation failed".to_string(),
            errors,
            details: None,
        }
    }

    /// Opaque bad-credentials failure (401).
    ///
    /// The message is identical whether the account is unknown or the
    /// password is wrong.
    pub fn invalid_credentials() -> Self {
        Self {
            kind: ErrorKind::Authentication,
            message: "Invalid credentials".to_string(),
            errors: Vec::new(),
            details: None,
        }
    }

    /// Opaque bearer-token failure (401).
    ///
    /// Malformed, forged, and expired tokens all produce this value.
    pub fn unauthorized() -> Self {
        Self {
            kind: ErrorKind::Authorization,
            message: "Unauthorized".to_string(),
            errors: Vec::new(),
            details: None,
        }
    }

    /// Duplicate-registration conflict (409).
    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Conflict,
            message: message.into(),
            errors: Vec::new(),
            details: None,
        }
    }

    /// Unexpected failure (500). The detail is logged but the response body
    /// is always the fixed generic message.
    pub fn unexpected(details: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Unexpected,
            message: "Internal server error".to_string(),
            errors: Vec::new(),
            details: Some(details.into()),
        }
    }

    fn log(&self) {
        match self.kind {
            ErrorKind::Unexpected => {
                tracing::error!(
                    error_kind = %self.kind,
                    details = %self.details.as_deref().unwrap_or("none"),
                    "request failed"
                );
            }
            ErrorKind::Authentication | ErrorKind::Authorization => {
                tracing::warn!(error_kind = %self.kind, "request rejected");
            }
            _ => {
                tracing::debug!(
                    error_kind = %self.kind,
                    message = %self.message,
                    "request rejected"
                );
            }
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for AppError {}

// ============================================================================
// Response Rendering
// ============================================================================

/// JSON body for error responses.
#[derive(Debug, serde::Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<FieldViolation>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();

        let status = self.kind.status_code();
        let body = ErrorBody {
            message: self.message,
            errors: self.errors,
        };

        (status, Json(body)).into_response()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ErrorKind::Validation.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorKind::Authentication.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorKind::Authorization.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorKind::Conflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(ErrorKind::Unexpected.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_unexpected_hides_details() {
        let err = AppError::unexpected("connection pool exhausted");
        assert_eq!(err.message, "Internal server error");
        assert_eq!(err.details.as_deref(), Some("connection pool exhausted"));
    }

    #[test]
    fn test_credential_and_token_failures_are_opaque() {
        let login = AppError::invalid_credentials();
        assert_eq!(login.message, "Invalid credentials");
        assert_eq!(login.kind, ErrorKind::Authentication);

        let bearer = AppError::unauthorized();
        assert_eq!(bearer.message, "Unauthorized");
        assert_eq!(bearer.kind, ErrorKind::Authorization);
    }

    #[test]
    fn test_into_response_status() {
        let response = AppError::conflict("User already exists").into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = AppError::validation(vec![FieldViolation::for_field(
            "email",
            "must be a valid email address",
        )])
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_display() {
        let err = AppError::conflict("User already exists");
        assert_eq!(format!("{}", err), "conflict: User already exists");
    }
}
