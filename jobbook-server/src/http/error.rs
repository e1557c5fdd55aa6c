//! API error types with IntoResponse
//!
//! Errors are converted to JSON responses with appropriate status codes:
//! `{"success": false, "error": <code>, "message": <text>}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::bookings::BookingError;
use crate::models::ValidationError;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Payload failed validation (400)
    Validation(ValidationError),

    /// Index outside the resolved group (400)
    InvalidIndex { index: i64, len: usize },

    /// No booking with this id (404)
    NotFound { id: String },

    /// Booking id already taken (409)
    Conflict { id: String },

    /// Unknown operation or HTTP method (405)
    MethodNotSupported { method: String },

    /// Store failure (500, logged)
    Database(sqlx::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidIndex { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::MethodNotSupported { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message) = match &self {
            Self::Validation(e) => ("validation_error", e.to_string()),
            Self::InvalidIndex { index, len } => (
                "invalid_index",
                format!("index {} is out of range for a group of {} bookings", index, len),
            ),
            Self::NotFound { id } => ("not_found", format!("booking '{}' not found", id)),
            Self::Conflict { id } => ("conflict", format!("booking '{}' already exists", id)),
            Self::MethodNotSupported { method } => (
                "method_not_supported",
                format!("method '{}' is not supported", method),
            ),
            Self::Database(e) => {
                // Log the actual error, return generic message
                tracing::error!("Database error: {}", e);
                ("internal_error", "an internal error occurred".to_owned())
            }
        };

        let body = json!({
            "success": false,
            "error": code,
            "message": message,
        });
        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<BookingError> for ApiError {
    fn from(e: BookingError) -> Self {
        match e {
            BookingError::Validation(e) => Self::Validation(e),
            BookingError::InvalidIndex { index, len } => Self::InvalidIndex { index, len },
            BookingError::NotFound { id } => Self::NotFound { id },
            BookingError::Conflict { id } => Self::Conflict { id },
            BookingError::MethodNotSupported { method } => Self::MethodNotSupported { method },
            BookingError::Store(e) => Self::Database(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn invalid_index_is_400() {
        let err = ApiError::from(BookingError::InvalidIndex { index: 3, len: 3 });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "invalid_index");
    }

    #[tokio::test]
    async fn status_mapping() {
        let cases = [
            (ApiError::Validation(ValidationError::Empty { field: "date_key" }), StatusCode::BAD_REQUEST),
            (ApiError::NotFound { id: "x".into() }, StatusCode::NOT_FOUND),
            (ApiError::Conflict { id: "x".into() }, StatusCode::CONFLICT),
            (ApiError::MethodNotSupported { method: "PATCH".into() }, StatusCode::METHOD_NOT_ALLOWED),
            (ApiError::Database(sqlx::Error::PoolTimedOut), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[tokio::test]
    async fn database_errors_do_not_leak_detail() {
        let err = ApiError::Database(sqlx::Error::Protocol("secret detail".into()));
        let body = body_json(err.into_response()).await;
        assert_eq!(body["error"], "internal_error");
        assert!(!body["message"].as_str().unwrap().contains("secret"));
    }
}
