//! API request handlers.

use crate::error::ApiError;
use crate::gateway::{ChainSnapshot, GatewayError, HistoryPeriod};
use crate::ledger::{NewTransaction, TransactionFilter};
use crate::models::{
    CreateTransactionRequest, ExpiryListResponse, ExpiryQuery, HealthResponse, HistoryQuery,
    IvResponse, MaxPainResponse, MessageResponse, OptionChainResponse, PcrResponse,
    PositionProfitResponse, PositionResponse, StockHistoryResponse, StockQuoteResponse,
    TransactionListQuery, TransactionResponse, TransactionSummaryResponse,
};
use crate::options;
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Default number of transactions returned by the list endpoint.
const DEFAULT_TRANSACTION_LIMIT: i64 = 100;
/// Upper bound on the transaction list limit.
const MAX_TRANSACTION_LIMIT: i64 = 500;

// ============================================================================
// Health Check
// ============================================================================

/// Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "Health"
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Stock
// ============================================================================

/// Get the current quote for a stock.
#[utoipa::path(
    get,
    path = "/stock/{symbol}",
    params(
        ("symbol" = String, Path, description = "Stock ticker symbol (e.g. AAPL)")
    ),
    responses(
        (status = 200, description = "Current stock quote", body = StockQuoteResponse),
        (status = 404, description = "Symbol not found"),
        (status = 500, description = "Market data provider unavailable")
    ),
    tag = "Stock"
)]
pub async fn get_stock(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<Json<StockQuoteResponse>, ApiError> {
    let quote = state.market.quote(&symbol).await?;

    quote
        .map(StockQuoteResponse::from)
        .map(Json)
        .ok_or_else(|| ApiError::SymbolNotFound(symbol.to_uppercase()))
}

/// Get historical OHLCV data for a stock.
#[utoipa::path(
    get,
    path = "/stock/{symbol}/history",
    params(
        ("symbol" = String, Path, description = "Stock ticker symbol"),
        ("period" = Option<String>, Query, description = "Period: 1d, 5d, 1mo, 3mo, 6mo, 1y, 2y, 5y, 10y, ytd, max (default 1mo)")
    ),
    responses(
        (status = 200, description = "Historical data", body = StockHistoryResponse),
        (status = 404, description = "No historical data for the symbol"),
        (status = 422, description = "Invalid period")
    ),
    tag = "Stock"
)]
pub async fn get_stock_history(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<StockHistoryResponse>, ApiError> {
    let period: HistoryPeriod = query
        .period
        .as_deref()
        .unwrap_or("1mo")
        .parse()
        .map_err(ApiError::Validation)?;

    let series = state.market.history(&symbol, period).await?;

    series
        .map(StockHistoryResponse::from)
        .map(Json)
        .ok_or_else(|| ApiError::SymbolNotFound(symbol.to_uppercase()))
}

// ============================================================================
// Transaction
// ============================================================================

/// Record a buy or sell transaction.
///
/// A BUY folds into the position's weighted average cost, creating the
/// position on first sight. A SELL decrements the held quantity and fails
/// when the inventory is short. The transaction record and the position
/// update commit atomically.
#[utoipa::path(
    post,
    path = "/transaction",
    request_body = CreateTransactionRequest,
    responses(
        (status = 201, description = "Transaction recorded", body = TransactionResponse),
        (status = 400, description = "Insufficient position for the sale"),
        (status = 422, description = "Non-positive price or quantity")
    ),
    tag = "Transaction"
)]
pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<TransactionResponse>), ApiError> {
    if body.symbol.trim().is_empty() {
        return Err(ApiError::Validation("symbol cannot be empty".to_string()));
    }
    if body.price <= Decimal::ZERO {
        return Err(ApiError::Validation("price must be positive".to_string()));
    }
    if body.quantity <= 0 {
        return Err(ApiError::Validation(
            "quantity must be positive".to_string(),
        ));
    }

    let row = state
        .ledger
        .record(NewTransaction {
            symbol: body.symbol,
            transaction_type: body.transaction_type,
            price: body.price,
            quantity: body.quantity,
            transaction_date: body.transaction_date,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(row.into())))
}

/// List transactions with optional filters.
#[utoipa::path(
    get,
    path = "/transaction",
    params(
        ("symbol" = Option<String>, Query, description = "Filter by stock symbol"),
        ("transaction_type" = Option<String>, Query, description = "Filter by type (BUY or SELL)"),
        ("limit" = Option<i64>, Query, description = "Maximum results, 1-500 (default 100)")
    ),
    responses(
        (status = 200, description = "Transactions, newest first", body = Vec<TransactionResponse>),
        (status = 422, description = "Limit out of range")
    ),
    tag = "Transaction"
)]
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TransactionListQuery>,
) -> Result<Json<Vec<TransactionResponse>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_TRANSACTION_LIMIT);
    if !(1..=MAX_TRANSACTION_LIMIT).contains(&limit) {
        return Err(ApiError::Validation(format!(
            "limit must be between 1 and {}",
            MAX_TRANSACTION_LIMIT
        )));
    }

    let rows = state
        .ledger
        .transactions(TransactionFilter {
            symbol: query.symbol,
            transaction_type: query.transaction_type,
            limit,
        })
        .await?;

    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// Get the transaction summary for a symbol.
#[utoipa::path(
    get,
    path = "/transaction/summary/{symbol}",
    params(
        ("symbol" = String, Path, description = "Stock ticker symbol")
    ),
    responses(
        (status = 200, description = "Transaction summary", body = TransactionSummaryResponse),
        (status = 404, description = "No transactions for the symbol")
    ),
    tag = "Transaction"
)]
pub async fn get_transaction_summary(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<Json<TransactionSummaryResponse>, ApiError> {
    let summary = state.ledger.summary(&symbol).await?;

    summary
        .map(TransactionSummaryResponse::from)
        .map(Json)
        .ok_or_else(|| ApiError::NoTransactions(symbol.to_uppercase()))
}

/// Get a single transaction by id.
#[utoipa::path(
    get,
    path = "/transaction/{id}",
    params(
        ("id" = i64, Path, description = "Transaction identifier")
    ),
    responses(
        (status = 200, description = "The transaction", body = TransactionResponse),
        (status = 404, description = "Transaction not found")
    ),
    tag = "Transaction"
)]
pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let row = state.ledger.transaction(id).await?;

    row.map(TransactionResponse::from)
        .map(Json)
        .ok_or(ApiError::TransactionNotFound(id))
}

/// Delete a transaction.
///
/// The position aggregate is NOT recalculated; this endpoint exists to
/// correct data-entry mistakes and can leave the ledger out of step with
/// the transaction log.
#[utoipa::path(
    delete,
    path = "/transaction/{id}",
    params(
        ("id" = i64, Path, description = "Transaction identifier")
    ),
    responses(
        (status = 200, description = "Transaction deleted", body = MessageResponse),
        (status = 404, description = "Transaction not found")
    ),
    tag = "Transaction"
)]
pub async fn delete_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    if state.ledger.delete(id).await? {
        Ok(Json(MessageResponse {
            message: "Transaction deleted successfully".to_string(),
        }))
    } else {
        Err(ApiError::TransactionNotFound(id))
    }
}

// ============================================================================
// Portfolio
// ============================================================================

/// List all positions.
#[utoipa::path(
    get,
    path = "/portfolio",
    responses(
        (status = 200, description = "All positions", body = Vec<PositionResponse>)
    ),
    tag = "Portfolio"
)]
pub async fn list_portfolio(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<PositionResponse>>, ApiError> {
    let positions = state.ledger.positions().await?;
    Ok(Json(positions.into_iter().map(Into::into).collect()))
}

/// List all positions with current prices and profit/loss.
///
/// When the market data provider is unavailable the price-dependent fields
/// are empty and the rest of the row is still returned.
#[utoipa::path(
    get,
    path = "/portfolio/profit",
    responses(
        (status = 200, description = "Positions with profit/loss", body = Vec<PositionProfitResponse>)
    ),
    tag = "Portfolio"
)]
pub async fn get_portfolio_profit(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<PositionProfitResponse>>, ApiError> {
    let profits = state.ledger.portfolio_profit().await?;
    Ok(Json(profits.into_iter().map(Into::into).collect()))
}

/// Get the position for a symbol.
#[utoipa::path(
    get,
    path = "/portfolio/{symbol}",
    params(
        ("symbol" = String, Path, description = "Stock ticker symbol")
    ),
    responses(
        (status = 200, description = "The position", body = PositionResponse),
        (status = 404, description = "No position for the symbol")
    ),
    tag = "Portfolio"
)]
pub async fn get_position(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<Json<PositionResponse>, ApiError> {
    let position = state.ledger.position(&symbol).await?;

    position
        .map(PositionResponse::from)
        .map(Json)
        .ok_or_else(|| ApiError::PositionNotFound(symbol.to_uppercase()))
}

/// Get the position for a symbol with current price and profit/loss.
#[utoipa::path(
    get,
    path = "/portfolio/{symbol}/profit",
    params(
        ("symbol" = String, Path, description = "Stock ticker symbol")
    ),
    responses(
        (status = 200, description = "The position with profit/loss", body = PositionProfitResponse),
        (status = 404, description = "No position for the symbol")
    ),
    tag = "Portfolio"
)]
pub async fn get_position_profit(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<Json<PositionProfitResponse>, ApiError> {
    let position = state
        .ledger
        .position(&symbol)
        .await?
        .ok_or_else(|| ApiError::PositionNotFound(symbol.to_uppercase()))?;

    let profit = state.ledger.position_profit(position).await;
    Ok(Json(profit.into()))
}

// ============================================================================
// Options
// ============================================================================

/// Parses an optional YYYY-MM-DD expiry query parameter.
fn parse_expiry(expiry: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
    expiry
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
                ApiError::Validation(format!("Invalid expiry date: {}. Use YYYY-MM-DD", s))
            })
        })
        .transpose()
}

/// Fetches the chain snapshot for a symbol and optional expiry.
async fn resolve_chain(
    state: &AppState,
    symbol: &str,
    query: &ExpiryQuery,
) -> Result<ChainSnapshot, ApiError> {
    let expiry = parse_expiry(query.expiry.as_deref())?;

    match state.market.option_chain(symbol, expiry).await {
        Ok(Some(chain)) => Ok(chain),
        Ok(None) => Err(ApiError::NoOptions(symbol.to_uppercase())),
        Err(GatewayError::UnknownExpiry { symbol, expiry }) => Err(ApiError::ExpiryNotFound {
            symbol,
            expiry: expiry.format("%Y-%m-%d").to_string(),
        }),
        Err(err) => Err(err.into()),
    }
}

/// Get the listed option expiries for a symbol.
#[utoipa::path(
    get,
    path = "/option/{symbol}/expiry",
    params(
        ("symbol" = String, Path, description = "Underlying ticker symbol")
    ),
    responses(
        (status = 200, description = "Listed expiries", body = ExpiryListResponse),
        (status = 404, description = "No options for the symbol")
    ),
    tag = "Option"
)]
pub async fn get_option_expiries(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<Json<ExpiryListResponse>, ApiError> {
    let expiries = state.market.expiries(&symbol).await?;

    expiries
        .map(ExpiryListResponse::from)
        .map(Json)
        .ok_or_else(|| ApiError::NoOptions(symbol.to_uppercase()))
}

/// Get the max pain analysis for a symbol.
///
/// Max pain approximates the strike where option holders lose the most:
/// the strike with the highest total open interest across calls and puts.
#[utoipa::path(
    get,
    path = "/option/{symbol}/max-pain",
    params(
        ("symbol" = String, Path, description = "Underlying ticker symbol"),
        ("expiry" = Option<String>, Query, description = "Expiry date (YYYY-MM-DD); defaults to the nearest")
    ),
    responses(
        (status = 200, description = "Max pain analysis", body = MaxPainResponse),
        (status = 404, description = "No options for the symbol or unknown expiry"),
        (status = 422, description = "Malformed expiry date")
    ),
    tag = "Option"
)]
pub async fn get_max_pain(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(query): Query<ExpiryQuery>,
) -> Result<Json<MaxPainResponse>, ApiError> {
    let chain = resolve_chain(&state, &symbol, &query).await?;

    options::max_pain(&chain)
        .map(|summary| Json(MaxPainResponse::build(&chain, summary)))
        .ok_or_else(|| ApiError::NoOptions(symbol.to_uppercase()))
}

/// Get the put/call ratio for a symbol.
#[utoipa::path(
    get,
    path = "/option/{symbol}/pcr",
    params(
        ("symbol" = String, Path, description = "Underlying ticker symbol"),
        ("expiry" = Option<String>, Query, description = "Expiry date (YYYY-MM-DD); defaults to the nearest")
    ),
    responses(
        (status = 200, description = "Put/call ratio analysis", body = PcrResponse),
        (status = 404, description = "No options for the symbol or unknown expiry"),
        (status = 422, description = "Malformed expiry date")
    ),
    tag = "Option"
)]
pub async fn get_put_call_ratio(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(query): Query<ExpiryQuery>,
) -> Result<Json<PcrResponse>, ApiError> {
    let chain = resolve_chain(&state, &symbol, &query).await?;

    options::put_call_ratio(&chain)
        .map(|summary| Json(PcrResponse::build(&chain, summary)))
        .ok_or_else(|| ApiError::NoOptions(symbol.to_uppercase()))
}

/// Get the at-the-money implied volatility for a symbol.
#[utoipa::path(
    get,
    path = "/option/{symbol}/iv",
    params(
        ("symbol" = String, Path, description = "Underlying ticker symbol"),
        ("expiry" = Option<String>, Query, description = "Expiry date (YYYY-MM-DD); defaults to the nearest")
    ),
    responses(
        (status = 200, description = "ATM implied volatility analysis", body = IvResponse),
        (status = 404, description = "No options for the symbol or unknown expiry"),
        (status = 422, description = "Malformed expiry date")
    ),
    tag = "Option"
)]
pub async fn get_atm_iv(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(query): Query<ExpiryQuery>,
) -> Result<Json<IvResponse>, ApiError> {
    let chain = resolve_chain(&state, &symbol, &query).await?;

    options::atm_implied_volatility(&chain)
        .map(|summary| Json(IvResponse::build(&chain, summary)))
        .ok_or_else(|| ApiError::NoOptions(symbol.to_uppercase()))
}

/// Get the full option chain for a symbol.
#[utoipa::path(
    get,
    path = "/option/{symbol}/chain",
    params(
        ("symbol" = String, Path, description = "Underlying ticker symbol"),
        ("expiry" = Option<String>, Query, description = "Expiry date (YYYY-MM-DD); defaults to the nearest")
    ),
    responses(
        (status = 200, description = "Option chain", body = OptionChainResponse),
        (status = 404, description = "No options for the symbol or unknown expiry"),
        (status = 422, description = "Malformed expiry date")
    ),
    tag = "Option"
)]
pub async fn get_option_chain(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(query): Query<ExpiryQuery>,
) -> Result<Json<OptionChainResponse>, ApiError> {
    let chain = resolve_chain(&state, &symbol, &query).await?;
    Ok(Json(chain.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_expiry_valid() {
        let parsed = parse_expiry(Some("2025-12-05")).expect("should parse");
        assert_eq!(parsed, NaiveDate::from_ymd_opt(2025, 12, 5));
    }

    #[test]
    fn test_parse_expiry_none() {
        assert!(parse_expiry(None).expect("should pass through").is_none());
    }

    #[test]
    fn test_parse_expiry_malformed() {
        let err = parse_expiry(Some("12/05/2025")).unwrap_err();
        match err {
            ApiError::Validation(msg) => assert!(msg.contains("Invalid expiry date")),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
