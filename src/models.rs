//! Request and response models for the REST API.

use crate::db::{PositionRow, TransactionRow};
use crate::gateway::{
    ChainSnapshot, ExpiryList, HistoryBar, HistorySeries, OptionContract, StockQuote,
};
use crate::ledger::{PositionProfit, TransactionSummary};
use crate::options::{IvSummary, MaxPainSummary, PcrSummary, StrikeOpenInterest};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Transaction direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    /// Purchase of shares.
    Buy,
    /// Sale of shares.
    Sell,
}

impl TransactionType {
    /// Returns the database representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }

    /// Parses the database representation. The CHECK constraint on the
    /// column restricts the stored values to BUY and SELL.
    #[must_use]
    pub fn from_db(value: &str) -> Self {
        match value {
            "SELL" => Self::Sell,
            _ => Self::Buy,
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Crate version.
    pub version: String,
}

/// Generic message response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    /// Human-readable message.
    pub message: String,
}

// ============================================================================
// Stock
// ============================================================================

/// Current stock quote.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StockQuoteResponse {
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

impl From<StockQuote> for StockQuoteResponse {
    fn from(quote: StockQuote) -> Self {
        Self {
            symbol: quote.symbol,
            name: quote.name,
            current_price: quote.current_price,
            previous_close: quote.previous_close,
            open_price: quote.open,
            day_high: quote.day_high,
            day_low: quote.day_low,
            volume: quote.volume,
            market_cap: quote.market_cap,
            currency: quote.currency,
            exchange: quote.exchange,
        }
    }
}

/// Query parameters for historical data.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// History period (default: 1mo).
    pub period: Option<String>,
}

/// One historical OHLCV bar.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HistoryBarResponse {
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

impl From<HistoryBar> for HistoryBarResponse {
    fn from(bar: HistoryBar) -> Self {
        Self {
            date: bar.date.format("%Y-%m-%d").to_string(),
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        }
    }
}

/// Historical data response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StockHistoryResponse {
    /// Ticker symbol.
    pub symbol: String,
    /// Period the series covers.
    pub period: String,
    /// Bars in ascending date order.
    pub data: Vec<HistoryBarResponse>,
}

impl From<HistorySeries> for StockHistoryResponse {
    fn from(series: HistorySeries) -> Self {
        Self {
            symbol: series.symbol,
            period: series.period.to_string(),
            data: series.bars.into_iter().map(Into::into).collect(),
        }
    }
}

// ============================================================================
// Transaction
// ============================================================================

/// Request to record a transaction.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateTransactionRequest {
    /// Stock symbol (e.g. AAPL, TSLA).
    pub symbol: String,
    /// Transaction direction.
    pub transaction_type: TransactionType,
    /// Price per share; must be positive.
    pub price: Decimal,
    /// Number of shares; must be positive.
    pub quantity: i64,
    /// Trade timestamp (defaults to now).
    #[serde(default)]
    pub transaction_date: Option<DateTime<Utc>>,
}

/// A recorded transaction.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransactionResponse {
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

impl From<TransactionRow> for TransactionResponse {
    fn from(row: TransactionRow) -> Self {
        Self {
            id: row.id,
            symbol: row.symbol,
            transaction_type: TransactionType::from_db(&row.transaction_type),
            price: row.price,
            quantity: row.quantity,
            transaction_date: row.transaction_date,
            created_at: row.created_at,
        }
    }
}

/// Query parameters for listing transactions.
#[derive(Debug, Deserialize)]
pub struct TransactionListQuery {
    /// Filter by stock symbol.
    pub symbol: Option<String>,
    /// Filter by transaction type.
    pub transaction_type: Option<TransactionType>,
    /// Maximum number of results (1-500, default 100).
    pub limit: Option<i64>,
}

/// Transaction summary for a symbol.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransactionSummaryResponse {
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

impl From<TransactionSummary> for TransactionSummaryResponse {
    fn from(summary: TransactionSummary) -> Self {
        Self {
            symbol: summary.symbol,
            total_bought: summary.total_bought,
            total_sold: summary.total_sold,
            current_quantity: summary.current_quantity,
            average_buy_price: summary.average_buy_price.round_dp(4),
            total_transactions: summary.transaction_count,
        }
    }
}

// ============================================================================
// Portfolio
// ============================================================================

/// A held position.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PositionResponse {
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

impl From<PositionRow> for PositionResponse {
    fn from(row: PositionRow) -> Self {
        Self {
            symbol: row.symbol,
            name: row.name,
            average_cost: row.average_cost,
            quantity: row.quantity,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// A held position with current price and profit/loss.
///
/// The price-dependent fields are empty when the market data provider is
/// unavailable; the response is then a partial result, not an error.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PositionProfitResponse {
    /// Stock symbol.
    pub symbol: String,
    /// Company display name, when known.
    pub name: Option<String>,
    /// Cost-weighted average purchase price.
    pub average_cost: Decimal,
    /// Current share count.
    pub quantity: i64,
    /// Current market price.
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

impl From<PositionProfit> for PositionProfitResponse {
    fn from(profit: PositionProfit) -> Self {
        Self {
            symbol: profit.position.symbol,
            name: profit.position.name,
            average_cost: profit.position.average_cost,
            quantity: profit.position.quantity,
            current_price: profit.current_price,
            total_cost: profit.total_cost,
            current_value: profit.current_value,
            profit_loss: profit.profit_loss,
            profit_loss_percent: profit.profit_loss_percent,
            created_at: profit.position.created_at,
        }
    }
}

// ============================================================================
// Options
// ============================================================================

/// Query parameter selecting an option expiry.
#[derive(Debug, Deserialize)]
pub struct ExpiryQuery {
    /// Expiry date (YYYY-MM-DD); defaults to the nearest listed expiry.
    pub expiry: Option<String>,
}

/// Listed option expiries for a symbol.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ExpiryListResponse {
    /// Underlying symbol.
    pub symbol: String,
    /// Current underlying price.
    pub current_price: f64,
    /// Expiry dates (YYYY-MM-DD) in ascending order.
    pub expiry_dates: Vec<String>,
}

impl From<ExpiryList> for ExpiryListResponse {
    fn from(list: ExpiryList) -> Self {
        Self {
            symbol: list.symbol,
            current_price: list.current_price,
            expiry_dates: list
                .dates
                .iter()
                .map(|d| d.format("%Y-%m-%d").to_string())
                .collect(),
        }
    }
}

/// One option contract row.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OptionContractResponse {
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

impl From<OptionContract> for OptionContractResponse {
    fn from(contract: OptionContract) -> Self {
        Self {
            strike: contract.strike,
            last_price: contract.last_price,
            bid: contract.bid,
            ask: contract.ask,
            volume: contract.volume,
            open_interest: contract.open_interest,
            implied_volatility: contract.implied_volatility,
        }
    }
}

/// Full option chain for one expiry.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OptionChainResponse {
    /// Underlying symbol.
    pub symbol: String,
    /// Expiry date (YYYY-MM-DD).
    pub expiry_date: String,
    /// Current underlying price.
    pub current_price: f64,
    /// Call contracts in ascending strike order.
    pub calls: Vec<OptionContractResponse>,
    /// Put contracts in ascending strike order.
    pub puts: Vec<OptionContractResponse>,
}

impl From<ChainSnapshot> for OptionChainResponse {
    fn from(chain: ChainSnapshot) -> Self {
        Self {
            symbol: chain.symbol,
            expiry_date: chain.expiry.format("%Y-%m-%d").to_string(),
            current_price: chain.current_price,
            calls: chain.calls.into_iter().map(Into::into).collect(),
            puts: chain.puts.into_iter().map(Into::into).collect(),
        }
    }
}

/// Aggregate open interest at one strike.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StrikeOpenInterestResponse {
    /// Strike price.
    pub strike: f64,
    /// Total open interest across calls and puts.
    pub open_interest: i64,
}

impl From<StrikeOpenInterest> for StrikeOpenInterestResponse {
    fn from(entry: StrikeOpenInterest) -> Self {
        Self {
            strike: entry.strike,
            open_interest: entry.open_interest,
        }
    }
}

/// Max pain analysis response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MaxPainResponse {
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
    pub top_strikes: Vec<StrikeOpenInterestResponse>,
}

impl MaxPainResponse {
    /// Builds the response from a chain and its analysis.
    #[must_use]
    pub fn build(chain: &ChainSnapshot, summary: MaxPainSummary) -> Self {
        Self {
            symbol: chain.symbol.clone(),
            expiry_date: chain.expiry.format("%Y-%m-%d").to_string(),
            current_price: chain.current_price,
            max_pain_price: summary.max_pain_strike,
            price_difference_percent: summary.price_difference_percent,
            top_strikes: summary.top_strikes.into_iter().map(Into::into).collect(),
        }
    }
}

/// Put/call ratio response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PcrResponse {
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

impl PcrResponse {
    /// Builds the response from a chain and its analysis.
    #[must_use]
    pub fn build(chain: &ChainSnapshot, summary: PcrSummary) -> Self {
        Self {
            symbol: chain.symbol.clone(),
            expiry_date: chain.expiry.format("%Y-%m-%d").to_string(),
            total_call_open_interest: summary.call_open_interest,
            total_put_open_interest: summary.put_open_interest,
            put_call_ratio: summary.ratio,
            interpretation: summary.interpretation.to_string(),
        }
    }
}

/// At-the-money implied volatility response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IvResponse {
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

impl IvResponse {
    /// Builds the response from a chain and its analysis.
    #[must_use]
    pub fn build(chain: &ChainSnapshot, summary: IvSummary) -> Self {
        Self {
            symbol: chain.symbol.clone(),
            expiry_date: chain.expiry.format("%Y-%m-%d").to_string(),
            current_price: chain.current_price,
            atm_strike: summary.atm_strike,
            atm_call_iv: summary.atm_call_iv,
            atm_put_iv: summary.atm_put_iv,
            average_iv: summary.average_iv,
            interpretation: summary.interpretation.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_type_serde() {
        assert_eq!(
            serde_json::to_string(&TransactionType::Buy).unwrap(),
            "\"BUY\""
        );
        let parsed: TransactionType = serde_json::from_str("\"SELL\"").unwrap();
        assert_eq!(parsed, TransactionType::Sell);
    }

    #[test]
    fn test_transaction_type_db_round_trip() {
        assert_eq!(
            TransactionType::from_db(TransactionType::Buy.as_str()),
            TransactionType::Buy
        );
        assert_eq!(
            TransactionType::from_db(TransactionType::Sell.as_str()),
            TransactionType::Sell
        );
    }

    #[test]
    fn test_create_transaction_request_deserialization() {
        let json = r#"{
            "symbol": "AAPL",
            "transaction_type": "BUY",
            "price": 180.50,
            "quantity": 10
        }"#;

        let request: CreateTransactionRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.symbol, "AAPL");
        assert_eq!(request.transaction_type, TransactionType::Buy);
        assert_eq!(request.price, rust_decimal_macros::dec!(180.50));
        assert_eq!(request.quantity, 10);
        assert!(request.transaction_date.is_none());
    }
}
