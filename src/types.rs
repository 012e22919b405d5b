// Error type shared by the HTTP handlers

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Payload too large")]
    PayloadTooLarge,

    #[error("Storage error: {0:#}")]
    Storage(anyhow::Error),

    #[error("Metadata store error: {0:#}")]
    Metadata(anyhow::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Storage(_) | AppError::Metadata(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Rejections are plain-text status lines. Client errors echo their message;
/// server errors never leak internals.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::Unauthorized => "Unauthorized".to_string(),
            AppError::NotFound(_) => "Not Found".to_string(),
            AppError::PayloadTooLarge => "Payload Too Large".to_string(),
            AppError::InvalidRequest(message) | AppError::Conflict(message) => message.clone(),
            AppError::Storage(_) | AppError::Metadata(_) | AppError::Internal(_) => {
                error!("Request failed: {}", self);
                "Internal Server Error".to_string()
            }
        };
        (status, body).into_response()
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;
