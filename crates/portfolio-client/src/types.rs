//! Request and response types for the Stock Portfolio API.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Transaction direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    /// Purchase of shares.
    Buy,
    /// Sale of shares.
    Sell,
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

// ============================================================================
// Health
// ============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
}

/// Generic message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Human-readable message.
    pub message: String,
}

// ============================================================================
// Stock
// ============================================================================

/// Current stock quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockQuote {
    /// Ticker symbol.
    pub symbol: String,
    /// Company display name.
    pub name: Option<String>,
    /// Last traded price.
    pub current_price: f64,
    /// Previous session close.
    pub previous_close: Option<f64>,
    /// Session open.
    pub open_price: Option<f64>,
    /// Session high.
    pub day_high: Option<f64>,
    /// Session low.
    pub day_low: Option<f64>,
    /// Session volume.
    pub volume: Option<i64>,
    /// Market capitalization.
    pub market_cap: Option<i64>,
    /// Quote currency.
    pub currency: Option<String>,
    /// Exchange name.
    pub exchange: Option<String>,
}

/// One historical OHLCV bar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryBar {
    /// Bar date (YYYY-MM-DD).
    pub date: String,
    /// Open price.
    pub open: f64,
    /// High price.
    pub high: f64,
    /// Low price.
    pub low: f64,
    /// Close price.
    pub close: f64,
    /// Volume.
    pub volume: i64,
}

/// Historical data response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockHistory {
    /// Ticker symbol.
    pub symbol: String,
    /// Period the series covers.
    pub period: String,
    /// Bars in ascending date order.
    pub data: Vec<HistoryBar>,
}

// ============================================================================
// Transactions
// ============================================================================

/// Request to record a transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTransactionRequest {
    /// Stock symbol.
    pub symbol: String,
    /// Transaction direction.
    pub transaction_type: TransactionType,
    /// Price per share.
    pub price: Decimal,
    /// Number of shares.
    pub quantity: i64,
    /// Trade timestamp (defaults to now on the server).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_date: Option<DateTime<Utc>>,
}

/// A recorded transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier.
    pub id: i64,
    /// Stock symbol, uppercased.
    pub symbol: String,
    /// Transaction direction.
    pub transaction_type: TransactionType,
    /// Price per share.
    pub price: Decimal,
    /// Number of shares.
    pub quantity: i64,
    /// When the trade happened.
    pub transaction_date: DateTime<Utc>,
    /// When the record was written.
    pub created_at: DateTime<Utc>,
}

/// Transaction summary for a symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionSummary {
    /// Symbol the summary covers.
    pub symbol: String,
    /// Total shares bought.
    pub total_bought: i64,
    /// Total shares sold.
    pub total_sold: i64,
    /// Shares still held.
    pub current_quantity: i64,
    /// Cost-weighted mean over BUY legs only.
    pub average_buy_price: Decimal,
    /// Number of transactions.
    pub total_transactions: i64,
}

// ============================================================================
// Portfolio
// ============================================================================

/// A held position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    /// Stock symbol.
    pub symbol: String,
    /// Company display name, when known.
    pub name: Option<String>,
    /// Cost-weighted average purchase price.
    pub average_cost: Decimal,
    /// Current share count.
    pub quantity: i64,
    /// When the position was first created.
    pub created_at: DateTime<Utc>,
    /// When the position was last recalculated.
    pub updated_at: DateTime<Utc>,
}

/// A held position with current price and profit/loss.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionProfit {
    /// Stock symbol.
    pub symbol: String,
    /// Company display name, when known.
    pub name: Option<String>,
    /// Cost-weighted average purchase price.
    pub average_cost: Decimal,
    /// Current share count.
    pub quantity: i64,
    /// Current market price; empty when the provider is unavailable.
    pub current_price: Option<f64>,
    /// Cost basis of the holding.
    pub total_cost: f64,
    /// Market value of the holding.
    pub current_value: Option<f64>,
    /// Unrealized profit or loss.
    pub profit_loss: Option<f64>,
    /// Profit or loss relative to cost.
    pub profit_loss_percent: Option<f64>,
    /// When the position was first created.
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Options
// ============================================================================

/// Listed option expiries for a symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpiryList {
    /// Underlying symbol.
    pub symbol: String,
    /// Current underlying price.
    pub current_price: f64,
    /// Expiry dates (YYYY-MM-DD) in ascending order.
    pub expiry_dates: Vec<String>,
}

/// One option contract row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionContract {
    /// Strike price.
    pub strike: f64,
    /// Last traded premium.
    pub last_price: Option<f64>,
    /// Best bid.
    pub bid: Option<f64>,
    /// Best ask.
    pub ask: Option<f64>,
    /// Session volume.
    pub volume: Option<i64>,
    /// Outstanding contracts at this strike.
    pub open_interest: Option<i64>,
    /// Implied volatility as a fraction.
    pub implied_volatility: Option<f64>,
}

/// Full option chain for one expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionChain {
    /// Underlying symbol.
    pub symbol: String,
    /// Expiry date (YYYY-MM-DD).
    pub expiry_date: String,
    /// Current underlying price.
    pub current_price: f64,
    /// Call contracts in ascending strike order.
    pub calls: Vec<OptionContract>,
    /// Put contracts in ascending strike order.
    pub puts: Vec<OptionContract>,
}

/// Aggregate open interest at one strike.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrikeOpenInterest {
    /// Strike price.
    pub strike: f64,
    /// Total open interest across calls and puts.
    pub open_interest: i64,
}

/// Max pain analysis response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaxPain {
    /// Underlying symbol.
    pub symbol: String,
    /// Expiry date (YYYY-MM-DD).
    pub expiry_date: String,
    /// Current underlying price.
    pub current_price: f64,
    /// Strike with the highest aggregate open interest.
    pub max_pain_price: f64,
    /// Percent distance of the max pain strike from the current price.
    pub price_difference_percent: f64,
    /// Top strikes by aggregate open interest, descending.
    pub top_strikes: Vec<StrikeOpenInterest>,
}

/// Put/call ratio response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PutCallRatio {
    /// Underlying symbol.
    pub symbol: String,
    /// Expiry date (YYYY-MM-DD).
    pub expiry_date: String,
    /// Total call-side open interest.
    pub total_call_open_interest: i64,
    /// Total put-side open interest.
    pub total_put_open_interest: i64,
    /// Put open interest divided by call open interest.
    pub put_call_ratio: f64,
    /// Sentiment reading: Bearish, Bullish or Neutral.
    pub interpretation: String,
}

/// At-the-money implied volatility response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtmImpliedVolatility {
    /// Underlying symbol.
    pub symbol: String,
    /// Expiry date (YYYY-MM-DD).
    pub expiry_date: String,
    /// Current underlying price.
    pub current_price: f64,
    /// Strike of the ATM contract.
    pub atm_strike: f64,
    /// ATM call implied volatility.
    pub atm_call_iv: Option<f64>,
    /// ATM put implied volatility.
    pub atm_put_iv: Option<f64>,
    /// Average of the available ATM implied volatilities.
    pub average_iv: f64,
    /// Volatility reading derived from the average.
    pub interpretation: String,
}
