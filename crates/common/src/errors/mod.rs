//! Error types for ThesisDesk services
//!
//! Provides a single error type for the admin API with:
//! - Distinct variants for each failure mode
//! - HTTP status code mapping
//! - Structured JSON error bodies carrying a human-readable `message`
//! - Per-field violation lists for validation failures

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Input errors
    ValidationError,
    EmptyBody,
    InvalidFormat,

    // Authentication errors
    Unauthorized,
    InvalidToken,
    ExpiredToken,

    // Authorization errors
    Forbidden,

    // Resource errors
    ThesisNotFound,
    UserNotFound,

    // Rate limiting
    RateLimited,

    // Database errors
    DatabaseError,
    ConnectionError,

    // Internal errors
    InternalError,
    ConfigurationError,
}

/// A single schema violation on a request field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Input errors
    #[error("{message}")]
    Validation {
        message: String,
        errors: Vec<FieldViolation>,
    },

    #[error("Request body is required")]
    EmptyBody,

    #[error("{message}")]
    InvalidFormat { message: String },

    // Authentication errors
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    ExpiredToken,

    // Authorization errors
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    // Resource errors
    #[error("Thesis not found: {id}")]
    ThesisNotFound { id: i64 },

    #[error("Author not found: {username}")]
    UserNotFound { username: String },

    // Rate limiting
    #[error("Rate limit exceeded: {limit} requests per second")]
    RateLimited { limit: u32 },

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Database connection error: {message}")]
    DatabaseConnection { message: String },

    // Internal errors
    #[error("Internal server error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl AppError {
    /// Build a validation error from a list of field violations
    pub fn validation(errors: Vec<FieldViolation>) -> Self {
        AppError::Validation {
            message: "Validation failed".to_string(),
            errors,
        }
    }

    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::EmptyBody => ErrorCode::EmptyBody,
            AppError::InvalidFormat { .. } => ErrorCode::InvalidFormat,
            AppError::Unauthorized { .. } => ErrorCode::Unauthorized,
            AppError::InvalidToken => ErrorCode::InvalidToken,
            AppError::ExpiredToken => ErrorCode::ExpiredToken,
            AppError::Forbidden { .. } => ErrorCode::Forbidden,
            AppError::ThesisNotFound { .. } => ErrorCode::ThesisNotFound,
            AppError::UserNotFound { .. } => ErrorCode::UserNotFound,
            AppError::RateLimited { .. } => ErrorCode::RateLimited,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::DatabaseConnection { .. } => ErrorCode::ConnectionError,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation { .. } |
            AppError::EmptyBody |
            AppError::InvalidFormat { .. } => StatusCode::BAD_REQUEST,

            // 401 Unauthorized
            AppError::Unauthorized { .. } |
            AppError::InvalidToken |
            AppError::ExpiredToken => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,

            // 404 Not Found
            AppError::ThesisNotFound { .. } |
            AppError::UserNotFound { .. } => StatusCode::NOT_FOUND,

            // 429 Too Many Requests
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,

            // 500 Internal Server Error
            AppError::Database(_) |
            AppError::DatabaseConnection { .. } |
            AppError::Internal { .. } |
            AppError::Configuration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

/// JSON error body returned on every failure path
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    pub code: ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldViolation>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();

        if self.is_server_error() {
            tracing::error!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Server error"
            );
        } else if self.is_client_error() {
            tracing::warn!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Client error"
            );
        }

        let errors = match self {
            AppError::Validation { errors, .. } => Some(errors),
            _ => None,
        };

        let body = ErrorResponse {
            message,
            code,
            errors,
        };

        (status, Json(body)).into_response()
    }
}

/// Flatten validator's per-field errors into violations, sorted by field name
pub fn violations_from(err: &validator::ValidationErrors) -> Vec<FieldViolation> {
    let mut violations = Vec::new();

    for (field, kind) in err.errors() {
        if let validator::ValidationErrorsKind::Field(errors) = kind {
            for error in errors {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value ({})", error.code));
                violations.push(FieldViolation::new(field.to_string(), message));
            }
        }
    }

    violations.sort_by(|a, b| a.field.cmp(&b.field));
    violations
}
