//! Exchange and API error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use orderbook::BookError;

/// Errors from the exchange facade
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("unknown market: {0}")]
    UnknownMarket(String),

    #[error(transparent)]
    Book(#[from] BookError),
}

/// HTTP-facing error wrapper
///
/// User-input failures map onto 4xx statuses; everything the book
/// reports is local and leaves its state untouched.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    /// A point read on something that is not there (empty book side)
    #[error("{0}")]
    NotFound(String),
}

impl From<BookError> for ApiError {
    fn from(err: BookError) -> Self {
        ApiError::Exchange(ExchangeError::Book(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::Exchange(ExchangeError::UnknownMarket(_)) => {
                (StatusCode::BAD_REQUEST, "UNKNOWN_MARKET")
            }
            ApiError::Exchange(ExchangeError::Book(BookError::InvalidOrder(_))) => {
                (StatusCode::BAD_REQUEST, "INVALID_ORDER")
            }
            ApiError::Exchange(ExchangeError::Book(BookError::UnknownOrder(_))) => {
                (StatusCode::NOT_FOUND, "UNKNOWN_ORDER")
            }
            ApiError::Exchange(ExchangeError::Book(BookError::InsufficientLiquidity {
                ..
            })) => (StatusCode::UNPROCESSABLE_ENTITY, "INSUFFICIENT_LIQUIDITY"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        };

        let body = Json(json!({
            "error": code,
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}
