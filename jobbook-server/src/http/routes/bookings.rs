//! Booking dispatcher endpoint
//!
//! `/bookings` accepts every method and routes by method + payload shape:
//! - `GET` lists all bookings grouped by date key
//! - `POST` runs the operation named by the body's `type` field
//! - anything else is 405

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::Method,
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use serde_json::{json, Value as JsonValue};

use crate::bookings::{BookingRequest, BookingResponse};
use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::models::ValidationError;

/// /bookings - dispatch one booking operation
async fn dispatch(
    State(state): State<Arc<AppState>>,
    method: Method,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request = match method {
        Method::GET => BookingRequest::List,
        Method::POST => BookingRequest::from_payload(parse_body(&body)?)?,
        other => {
            return Err(ApiError::MethodNotSupported {
                method: other.to_string(),
            })
        }
    };

    let operation = request.name();
    let response = state.bookings.execute(request).await.inspect_err(|e| {
        tracing::debug!(operation, error = %e, "booking operation rejected");
    })?;
    tracing::debug!(operation, "booking operation applied");

    Ok(render(response))
}

/// An empty body decodes as `{}` (which then has no operation tag).
fn parse_body(body: &[u8]) -> Result<JsonValue, ValidationError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(json!({}));
    }
    Ok(serde_json::from_slice(body)?)
}

fn render(response: BookingResponse) -> Response {
    match response {
        BookingResponse::Listing(map) => Json(map).into_response(),
        BookingResponse::Added { id } => Json(json!({ "success": true, "id": id })).into_response(),
        BookingResponse::Updated | BookingResponse::Deleted => {
            Json(json!({ "success": true })).into_response()
        }
    }
}

/// Booking routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/bookings", any(dispatch))
}
