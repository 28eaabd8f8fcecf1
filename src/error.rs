//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::store::StoreError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("{0}")]
    InvalidEventId(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Event not found: {0}")]
    EventNotFound(i64),

    // Store errors (404 / 5xx)
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, Option<String>) {
        match self {
            // 400 Bad Request
            AppError::InvalidEventId(_) => (StatusCode::BAD_REQUEST, "invalid_event_id", None),
            AppError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", Some(msg.clone()))
            }

            // 404 Not Found
            AppError::EventNotFound(id) | AppError::Store(StoreError::NotFound(id)) => {
                (StatusCode::NOT_FOUND, "event_not_found", Some(id.to_string()))
            }

            // 500 Internal Server Error
            AppError::Store(StoreError::Database(e)) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, details) = self.parts();

        // Never echo driver messages back to the client
        let error = match &self {
            AppError::Store(StoreError::Database(_)) => "Database error".to_string(),
            _ => self.to_string(),
        };

        let body = ErrorResponse {
            error,
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}
