use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Unauthorized: {0}")]
    Unauthorized(anyhow::Error),

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    /// The database client was never configured for this process.
    #[error("Database not initialized")]
    DatabaseUnavailable,

    #[error("Database error: {0}")]
    DatabaseError(anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::DatabaseError(anyhow::Error::new(err))
    }
}

/// Error half of the `{ success, data | error }` envelope.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, details: Option<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            details,
        }
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) | AppError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            AppError::InternalError(_)
            | AppError::DatabaseUnavailable
            | AppError::DatabaseError(_)
            | AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let (error_message, details) = match self {
            AppError::ValidationError(err) => {
                ("Validation error".to_string(), Some(err.to_string()))
            }
            AppError::BadRequest(err) => (err.to_string(), None),
            AppError::NotFound(err) => (err.to_string(), None),
            AppError::Unauthorized(err) => (err.to_string(), None),
            AppError::InvalidToken(err) => {
                ("Authentication required".to_string(), Some(err.to_string()))
            }
            AppError::InternalError(err) => {
                tracing::error!(error = ?err, "Unhandled internal error");
                ("Unknown error".to_string(), None)
            }
            AppError::DatabaseUnavailable => ("Database not initialized".to_string(), None),
            AppError::DatabaseError(err) => ("Database error".to_string(), Some(err.to_string())),
            AppError::ConfigError(err) => {
                ("Configuration error".to_string(), Some(err.to_string()))
            }
        };

        (status, Json(ErrorResponse::new(error_message, details))).into_response()
    }
}
