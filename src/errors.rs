use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::models::BookingStatus;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("booking is already {0:?}")]
    AlreadyTerminal(BookingStatus),

    #[error("invalid payment amount: {0}")]
    InvalidPaymentAmount(f64),

    #[error("duplicate transaction: {0}")]
    DuplicateTransaction(String),

    #[error("no driver available for the requested pickup time")]
    NoDriverAvailable,

    #[error("route lookup failed: {0}")]
    Routing(String),

    #[error("payment provider error: {0}")]
    Payment(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InvalidTransition { .. } => StatusCode::CONFLICT,
            AppError::AlreadyTerminal(_) => StatusCode::CONFLICT,
            AppError::InvalidPaymentAmount(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::DuplicateTransaction(_) => StatusCode::CONFLICT,
            AppError::NoDriverAvailable => StatusCode::CONFLICT,
            AppError::Routing(_) => StatusCode::BAD_GATEWAY,
            AppError::Payment(_) => StatusCode::BAD_GATEWAY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
        };

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
