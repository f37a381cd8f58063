//! Error types for the REST API.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;


/// API error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message.
    pub error: String,
    /// Error code.
    pub code: String,
}

/// API error types.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Stock symbol unknown to the market data provider.
    #[error("Stock symbol '{0}' not found")]
    SymbolNotFound(String),

    /// No position held for the symbol.
    #[error("No position found for symbol '{0}'")]
    PositionNotFound(String),

    /// Transaction id does not exist.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(i64),

    /// No transactions recorded for the symbol.
    #[error("No transactions found for symbol '{0}'")]
    NoTransactions(String),

    /// The symbol has no listed options.
    #[error("No options found for symbol '{0}'")]
    NoOptions(String),

    /// The requested expiry is not in the listed set.
    #[error("Expiry {expiry} not found for symbol '{symbol}'")]
    ExpiryNotFound {
        /// Underlying symbol.
        symbol: String,
        /// Requested expiry date.
        expiry: String,
    },

    /// Malformed or out-of-range request input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Selling a symbol that was never bought.
    #[error("Cannot sell {0}: No portfolio found")]
    NoPosition(String),

    /// Selling more shares than currently held.
    #[error("Cannot sell {requested} shares of {symbol}: Only {available} shares available")]
    InsufficientPosition {
        /// Symbol being sold.
        symbol: String,
        /// Quantity requested.
        requested: i64,
        /// Quantity actually held.
        available: i64,
    },

    /// Market data provider failure.
    #[error("Upstream market data error: {0}")]
    Upstream(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::SymbolNotFound(_) => (StatusCode::NOT_FOUND, "SYMBOL_NOT_FOUND"),
            ApiError::PositionNotFound(_) => (StatusCode::NOT_FOUND, "POSITION_NOT_FOUND"),
            ApiError::TransactionNotFound(_) => (StatusCode::NOT_FOUND, "TRANSACTION_NOT_FOUND"),
            ApiError::NoTransactions(_) => (StatusCode::NOT_FOUND, "NO_TRANSACTIONS"),
            ApiError::NoOptions(_) => (StatusCode::NOT_FOUND, "NO_OPTIONS"),
            ApiError::ExpiryNotFound { .. } => (StatusCode::NOT_FOUND, "EXPIRY_NOT_FOUND"),
            ApiError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            ApiError::NoPosition(_) => (StatusCode::BAD_REQUEST, "NO_POSITION"),
            ApiError::InsufficientPosition { .. } => {
                (StatusCode::BAD_REQUEST, "INSUFFICIENT_POSITION")
            }
            ApiError::Upstream(_) => (StatusCode::INTERNAL_SERVER_ERROR, "UPSTREAM_ERROR"),
            ApiError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
        };

        // Internal failure detail goes to the log, not the response body.
        let message = match &self {
            ApiError::Upstream(detail) => {
                tracing::error!(%detail, "market data provider failure");
                "Market data provider unavailable".to_string()
            }
            ApiError::Database(detail) => {
                tracing::error!(%detail, "database failure");
                "Internal database error".to_string()
            }
            _ => self.to_string(),
        };

        let body = Json(ErrorResponse {
            error: message,
            code: code.to_string(),
        });

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Database(err.to_string())
    }
}

impl From<crate::gateway::GatewayError> for ApiError {
    fn from(err: crate::gateway::GatewayError) -> Self {
        ApiError::Upstream(err.to_string())
    }
}

impl From<crate::ledger::LedgerError> for ApiError {
    fn from(err: crate::ledger::LedgerError) -> Self {
        use crate::ledger::LedgerError;
        match err {
            LedgerError::NoPosition { symbol } => ApiError::NoPosition(symbol),
            LedgerError::InsufficientPosition {
                symbol,
                requested,
                available,
            } => ApiError::InsufficientPosition {
                symbol,
                requested,
                available,
            },
            LedgerError::Store(e) => ApiError::Database(e.to_string()),
        }
    }
}
