use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use crate::domain::repositories::RepositoryError;
use crate::infrastructure::security::password::PasswordError;
use crate::infrastructure::session::SessionError;
use crate::presentation::templates::RenderError;

/// Application error types that can be converted to HTTP responses.
///
/// Responses carry only the canonical status text; the detail goes to the log.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid request: {message}")]
    BadRequest { message: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Session error: {message}")]
    Session { message: String },

    #[error("Template error: {message}")]
    Template { message: String },

    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Database { .. }
            | AppError::Session { .. }
            | AppError::Template { .. }
            | AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type for logging
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::BadRequest { .. } => "bad_request",
            AppError::NotFound { .. } => "not_found",
            AppError::Database { .. } => "database",
            AppError::Session { .. } => "session",
            AppError::Template { .. } => "template",
            AppError::Internal { .. } => "internal",
        }
    }

    /// Check if this error should be logged as an error (vs warning)
    pub fn should_log_as_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    pub fn not_found() -> Self {
        AppError::NotFound { resource: "page".to_string() }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if self.should_log_as_error() {
            error!(error_type = self.error_type(), "Application error: {}", self);
        } else {
            warn!(error_type = self.error_type(), "Application warning: {}", self);
        }

        (status, status.canonical_reason().unwrap_or_default()).into_response()
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => AppError::NotFound { resource: "record".to_string() },
            RepositoryError::Database(e) => AppError::Database { message: e.to_string() },
            RepositoryError::DuplicateEmail
            | RepositoryError::InvalidCredentials
            | RepositoryError::Internal { .. } => AppError::Internal { message: err.to_string() },
        }
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        AppError::Session { message: err.to_string() }
    }
}

impl From<RenderError> for AppError {
    fn from(err: RenderError) -> Self {
        AppError::Template { message: err.to_string() }
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::Internal { message: err.to_string() }
    }
}
