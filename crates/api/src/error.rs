//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use reservation::ReservationError;
use thiserror::Error;

/// API-level error type that maps to HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad request from the client.
    #[error("{0}")]
    BadRequest(String),
    /// Reservation operation error.
    #[error(transparent)]
    Reservation(#[from] ReservationError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, error_body(msg)),
            ApiError::Reservation(err) => reservation_error_to_response(err),
        };

        (status, axum::Json(body)).into_response()
    }
}

fn error_body(message: String) -> serde_json::Value {
    serde_json::json!({ "error": message })
}

fn reservation_error_to_response(err: ReservationError) -> (StatusCode, serde_json::Value) {
    match err {
        ReservationError::SeatConflict { ref seats } => {
            let body = serde_json::json!({
                "error": err.to_string(),
                "conflicting_seats": seats,
            });
            (StatusCode::CONFLICT, body)
        }
        ReservationError::Validation(_) => (StatusCode::BAD_REQUEST, error_body(err.to_string())),
        ReservationError::Ledger(_) | ReservationError::Inventory(_) => {
            tracing::error!(error = %err, "internal server error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_body(err.to_string()),
            )
        }
    }
}
