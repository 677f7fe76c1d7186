//! Application error types

use serde::Serialize;
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response from the market-data backend.
    #[error("Network error ({}): {body}", .status.map(|s| s.to_string()).unwrap_or_else(|| "transport".to_string()))]
    Network { status: Option<u16>, body: String },

    #[error("Validation error: {0}")]
    Validation(String),

    /// Unexpected value in an otherwise well-formed backend response,
    /// e.g. an unrecognized refresh-status phase.
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Refresh error: {0}")]
    Refresh(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Operation canceled")]
    Canceled,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn to_response(&self) -> ErrorResponse {
        let code = match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Http(_) => "HTTP_ERROR",
            AppError::Network { .. } => "NETWORK_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Protocol(_) => "PROTOCOL_ERROR",
            AppError::Refresh(_) => "REFRESH_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Canceled => "CANCELED",
            AppError::Internal(_) => "INTERNAL_ERROR",
        };

        ErrorResponse {
            code: code.to_string(),
            message: self.to_string(),
        }
    }
}

/// Serializable error response for frontend consumers
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<AppError> for ErrorResponse {
    fn from(err: AppError) -> Self {
        err.to_response()
    }
}

// Allow AppError to cross the UI boundary as structured JSON
impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        self.to_response().serialize(serializer)
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
