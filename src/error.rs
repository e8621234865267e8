//! Error types for Bookshelf server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Error code reported by the hosted store when a single-row request
/// matched zero rows.
pub const NO_ROWS_CODE: &str = "PGRST116";

/// Application error codes exposed in API error bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    NotAuthorized = 2,
    DataServiceFailure = 3,
    NoSuchData = 4,
    BadValue = 5,
    IdentityFailure = 6,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// A required input was missing or malformed; detected before any remote call.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// An error reported by the hosted data or identity service.
    #[error("{message}")]
    Remote {
        code: Option<String>,
        message: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn remote(code: Option<String>, message: impl Into<String>) -> Self {
        AppError::Remote {
            code,
            message: message.into(),
        }
    }

    /// True when the store reported zero rows for a single-row request.
    pub fn is_no_rows(&self) -> bool {
        matches!(self, AppError::Remote { code: Some(code), .. } if code == NO_ROWS_CODE)
    }

    /// Log a failed remote operation and wrap it with a description of what was attempted.
    ///
    /// Local validation and not-found outcomes pass through untouched.
    pub fn context(self, action: &str) -> Self {
        match self {
            AppError::Remote { code, message } => {
                tracing::error!(code = ?code, "Data service error while {}: {}", action, message);
                AppError::Remote {
                    code,
                    message: format!("Unable to complete {}: {}", action, message),
                }
            }
            AppError::Http(e) => {
                tracing::error!("Connection error while {}: {}", action, e);
                AppError::Remote {
                    code: e.status().map(|s| s.as_u16().to_string()),
                    message: format!("Unable to complete {}: {}", action, e),
                }
            }
            AppError::Serialization(e) => {
                tracing::error!("Unexpected payload while {}: {}", action, e);
                AppError::Internal(format!("Unexpected payload while {}: {}", action, e))
            }
            other => other,
        }
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone())
            }
            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, ErrorCode::NoSuchData, msg.clone())
            }
            AppError::Authentication(msg) => {
                (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::Remote { code, message } => {
                tracing::error!("Data service error: {:?} {}", code, message);
                (
                    StatusCode::BAD_GATEWAY,
                    ErrorCode::DataServiceFailure,
                    message.clone(),
                )
            }
            AppError::Http(e) => {
                tracing::error!("HTTP error: {:?}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    ErrorCode::IdentityFailure,
                    "Upstream service unavailable".to_string(),
                )
            }
            AppError::Serialization(e) => {
                tracing::error!("Serialization error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

/// Fail with a validation error when a required identifier is empty or blank.
pub fn require_id<'a>(name: &str, value: &'a str) -> AppResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} is required", name)));
    }
    Ok(trimmed)
}
