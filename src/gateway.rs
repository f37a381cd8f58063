//! Upstream market data gateway.
//!
//! Wraps the Yahoo Finance JSON endpoints behind the [`MarketData`] port so
//! the ledger and the API handlers depend on the capability rather than the
//! concrete provider. Every call carries a bounded timeout; there is no
//! caching and no retry layer.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime};
use reqwest::StatusCode;
use serde::Deserialize;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

use crate::config::MarketDataConfig;

/// Gateway error types.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Transport or decoding failure from the HTTP client.
    #[error("market data request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider responded with an unexpected HTTP status.
    #[error("market data provider returned HTTP {0}")]
    Status(u16),

    /// The requested expiry is not listed for the symbol.
    #[error("expiry {expiry} is not listed for {symbol}")]
    UnknownExpiry {
        /// Underlying symbol.
        symbol: String,
        /// Requested expiry date.
        expiry: NaiveDate,
    },
}

/// Current quote for a stock symbol.
#[derive(Debug, Clone)]
pub struct StockQuote {
    /// Ticker symbol, uppercased.
    pub symbol: String,
    /// Long display name, when the provider carries one.
    pub name: Option<String>,
    /// Last traded price.
    pub current_price: f64,
    /// Previous session close.
    pub previous_close: Option<f64>,
    /// Session open.
    pub open: Option<f64>,
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

/// One daily OHLCV bar.
#[derive(Debug, Clone, Copy)]
pub struct HistoryBar {
    /// Bar date.
    pub date: NaiveDate,
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

/// Ordered historical series for a symbol.
#[derive(Debug, Clone)]
pub struct HistorySeries {
    /// Ticker symbol, uppercased.
    pub symbol: String,
    /// Period the series covers.
    pub period: HistoryPeriod,
    /// Bars in ascending date order.
    pub bars: Vec<HistoryBar>,
}

/// Listed option expiries for a symbol.
#[derive(Debug, Clone)]
pub struct ExpiryList {
    /// Ticker symbol, uppercased.
    pub symbol: String,
    /// Current underlying price.
    pub current_price: f64,
    /// Expiry dates in ascending order.
    pub dates: Vec<NaiveDate>,
}

/// One option contract row from a chain.
#[derive(Debug, Clone, Copy)]
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
    /// Implied volatility as a fraction (0.30 = 30%).
    pub implied_volatility: Option<f64>,
}

/// Snapshot of an option chain for one expiry.
#[derive(Debug, Clone)]
pub struct ChainSnapshot {
    /// Underlying symbol, uppercased.
    pub symbol: String,
    /// Expiry this snapshot covers.
    pub expiry: NaiveDate,
    /// Current underlying price (0.0 when the provider omits it).
    pub current_price: f64,
    /// Call contracts in ascending strike order.
    pub calls: Vec<OptionContract>,
    /// Put contracts in ascending strike order.
    pub puts: Vec<OptionContract>,
}

/// Supported history periods, matching the provider's range parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryPeriod {
    /// One day.
    OneDay,
    /// Five days.
    FiveDays,
    /// One month.
    OneMonth,
    /// Three months.
    ThreeMonths,
    /// Six months.
    SixMonths,
    /// One year.
    OneYear,
    /// Two years.
    TwoYears,
    /// Five years.
    FiveYears,
    /// Ten years.
    TenYears,
    /// Year to date.
    YearToDate,
    /// Full listing history.
    Max,
}

impl HistoryPeriod {
    /// Returns the provider's range parameter for this period.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneDay => "1d",
            Self::FiveDays => "5d",
            Self::OneMonth => "1mo",
            Self::ThreeMonths => "3mo",
            Self::SixMonths => "6mo",
            Self::OneYear => "1y",
            Self::TwoYears => "2y",
            Self::FiveYears => "5y",
            Self::TenYears => "10y",
            Self::YearToDate => "ytd",
            Self::Max => "max",
        }
    }
}

impl FromStr for HistoryPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1d" => Ok(Self::OneDay),
            "5d" => Ok(Self::FiveDays),
            "1mo" => Ok(Self::OneMonth),
            "3mo" => Ok(Self::ThreeMonths),
            "6mo" => Ok(Self::SixMonths),
            "1y" => Ok(Self::OneYear),
            "2y" => Ok(Self::TwoYears),
            "5y" => Ok(Self::FiveYears),
            "10y" => Ok(Self::TenYears),
            "ytd" => Ok(Self::YearToDate),
            "max" => Ok(Self::Max),
            other => Err(format!(
                "Invalid period: {}. Use 1d, 5d, 1mo, 3mo, 6mo, 1y, 2y, 5y, 10y, ytd or max",
                other
            )),
        }
    }
}

impl std::fmt::Display for HistoryPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Market data port.
///
/// Every method returns `Ok(None)` when the provider does not know the
/// symbol (or has no data of the requested kind), and `Err` only on
/// transport-level failures.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Fetches the current quote for a symbol.
    async fn quote(&self, symbol: &str) -> Result<Option<StockQuote>, GatewayError>;

    /// Fetches the historical OHLCV series for a symbol.
    async fn history(
        &self,
        symbol: &str,
        period: HistoryPeriod,
    ) -> Result<Option<HistorySeries>, GatewayError>;

    /// Fetches the listed option expiries for a symbol.
    async fn expiries(&self, symbol: &str) -> Result<Option<ExpiryList>, GatewayError>;

    /// Fetches the option chain for a symbol.
    ///
    /// `expiry = None` selects the nearest listed expiry. An explicit expiry
    /// outside the listed set fails with [`GatewayError::UnknownExpiry`].
    async fn option_chain(
        &self,
        symbol: &str,
        expiry: Option<NaiveDate>,
    ) -> Result<Option<ChainSnapshot>, GatewayError>;
}

/// Yahoo Finance implementation of the market data port.
#[derive(Debug, Clone)]
pub struct YahooGateway {
    client: reqwest::Client,
    base_url: String,
}

impl YahooGateway {
    /// Creates a gateway from the market data configuration.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: &MarketDataConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetches and decodes a JSON payload, mapping provider 404s to `None`.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>, GatewayError> {
        debug!(%url, "market data request");
        let resp = self.client.get(url).query(query).send().await?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(resp.json::<T>().await?)),
            status => Err(GatewayError::Status(status.as_u16())),
        }
    }

    async fn fetch_options(
        &self,
        symbol: &str,
        date: Option<i64>,
    ) -> Result<Option<OptionsResultWire>, GatewayError> {
        let url = format!("{}/v7/finance/options/{}", self.base_url, symbol);
        let mut query = Vec::new();
        if let Some(epoch) = date {
            query.push(("date", epoch.to_string()));
        }

        let envelope: Option<OptionsEnvelope> = self.get_json(&url, &query).await?;
        Ok(envelope.and_then(|e| e.option_chain.result.into_iter().next()))
    }
}

#[async_trait]
impl MarketData for YahooGateway {
    async fn quote(&self, symbol: &str) -> Result<Option<StockQuote>, GatewayError> {
        let url = format!("{}/v7/finance/quote", self.base_url);
        let query = [("symbols", symbol.to_uppercase())];

        let envelope: Option<QuoteEnvelope> = self.get_json(&url, &query).await?;
        Ok(envelope
            .and_then(|e| e.quote_response.result.into_iter().next())
            .and_then(quote_from_wire))
    }

    async fn history(
        &self,
        symbol: &str,
        period: HistoryPeriod,
    ) -> Result<Option<HistorySeries>, GatewayError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol.to_uppercase());
        let query = [
            ("range", period.as_str().to_string()),
            ("interval", "1d".to_string()),
        ];

        let envelope: Option<ChartEnvelope> = self.get_json(&url, &query).await?;
        Ok(envelope
            .and_then(|e| e.chart.result.into_iter().flatten().next())
            .and_then(|result| series_from_wire(symbol, period, result)))
    }

    async fn expiries(&self, symbol: &str) -> Result<Option<ExpiryList>, GatewayError> {
        let Some(result) = self.fetch_options(&symbol.to_uppercase(), None).await? else {
            return Ok(None);
        };

        let dates: Vec<NaiveDate> = result
            .expiration_dates
            .iter()
            .copied()
            .filter_map(epoch_to_date)
            .collect();

        if dates.is_empty() {
            return Ok(None);
        }

        Ok(Some(ExpiryList {
            symbol: symbol.to_uppercase(),
            current_price: result
                .quote
                .as_ref()
                .and_then(|q| q.regular_market_price)
                .unwrap_or_default(),
            dates,
        }))
    }

    async fn option_chain(
        &self,
        symbol: &str,
        expiry: Option<NaiveDate>,
    ) -> Result<Option<ChainSnapshot>, GatewayError> {
        let symbol = symbol.to_uppercase();

        // The undated request returns the expiry list plus the nearest chain.
        let Some(nearest) = self.fetch_options(&symbol, None).await? else {
            return Ok(None);
        };
        if nearest.expiration_dates.is_empty() {
            return Ok(None);
        }

        let result = match expiry {
            None => nearest,
            Some(date) => {
                let epoch = date_to_epoch(date);
                if !nearest.expiration_dates.contains(&epoch) {
                    return Err(GatewayError::UnknownExpiry {
                        symbol,
                        expiry: date,
                    });
                }
                if nearest
                    .options
                    .first()
                    .is_some_and(|o| o.expiration_date == epoch)
                {
                    nearest
                } else {
                    match self.fetch_options(&symbol, Some(epoch)).await? {
                        Some(result) => result,
                        None => return Ok(None),
                    }
                }
            }
        };

        Ok(snapshot_from_wire(&symbol, result))
    }
}

// ============================================================================
// Wire Format
// ============================================================================

#[derive(Debug, Deserialize)]
struct QuoteEnvelope {
    #[serde(rename = "quoteResponse")]
    quote_response: QuoteResponseWire,
}

#[derive(Debug, Deserialize)]
struct QuoteResponseWire {
    #[serde(default)]
    result: Vec<QuoteWire>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteWire {
    symbol: String,
    long_name: Option<String>,
    short_name: Option<String>,
    regular_market_price: Option<f64>,
    regular_market_previous_close: Option<f64>,
    regular_market_open: Option<f64>,
    regular_market_day_high: Option<f64>,
    regular_market_day_low: Option<f64>,
    regular_market_volume: Option<i64>,
    market_cap: Option<i64>,
    currency: Option<String>,
    full_exchange_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartWire,
}

#[derive(Debug, Deserialize)]
struct ChartWire {
    result: Option<Vec<ChartResultWire>>,
}

#[derive(Debug, Deserialize)]
struct ChartResultWire {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: IndicatorsWire,
}

#[derive(Debug, Deserialize)]
struct IndicatorsWire {
    quote: Vec<ChartQuoteWire>,
}

#[derive(Debug, Deserialize)]
struct ChartQuoteWire {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<i64>>,
}

#[derive(Debug, Deserialize)]
struct OptionsEnvelope {
    #[serde(rename = "optionChain")]
    option_chain: OptionChainWire,
}

#[derive(Debug, Deserialize)]
struct OptionChainWire {
    #[serde(default)]
    result: Vec<OptionsResultWire>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionsResultWire {
    #[serde(default)]
    expiration_dates: Vec<i64>,
    quote: Option<UnderlyingQuoteWire>,
    #[serde(default)]
    options: Vec<OptionPeriodWire>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UnderlyingQuoteWire {
    regular_market_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionPeriodWire {
    expiration_date: i64,
    #[serde(default)]
    calls: Vec<ContractWire>,
    #[serde(default)]
    puts: Vec<ContractWire>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContractWire {
    strike: f64,
    last_price: Option<f64>,
    bid: Option<f64>,
    ask: Option<f64>,
    volume: Option<i64>,
    open_interest: Option<i64>,
    implied_volatility: Option<f64>,
}

// ============================================================================
// Wire Conversion
// ============================================================================

fn quote_from_wire(wire: QuoteWire) -> Option<StockQuote> {
    // A result without a live price is treated as an unknown symbol.
    let current_price = wire.regular_market_price?;

    Some(StockQuote {
        symbol: wire.symbol.to_uppercase(),
        name: wire.long_name.or(wire.short_name),
        current_price,
        previous_close: wire.regular_market_previous_close,
        open: wire.regular_market_open,
        day_high: wire.regular_market_day_high,
        day_low: wire.regular_market_day_low,
        volume: wire.regular_market_volume,
        market_cap: wire.market_cap,
        currency: wire.currency,
        exchange: wire.full_exchange_name,
    })
}

fn series_from_wire(
    symbol: &str,
    period: HistoryPeriod,
    result: ChartResultWire,
) -> Option<HistorySeries> {
    let quote = result.indicators.quote.into_iter().next()?;

    let mut bars = Vec::with_capacity(result.timestamp.len());
    for (i, epoch) in result.timestamp.iter().enumerate() {
        let Some(date) = epoch_to_date(*epoch) else {
            continue;
        };
        // Rows with a hole in OHLC are dropped, matching the provider's
        // untraded-session placeholders.
        let (Some(open), Some(high), Some(low), Some(close)) = (
            quote.open.get(i).copied().flatten(),
            quote.high.get(i).copied().flatten(),
            quote.low.get(i).copied().flatten(),
            quote.close.get(i).copied().flatten(),
        ) else {
            continue;
        };

        bars.push(HistoryBar {
            date,
            open,
            high,
            low,
            close,
            volume: quote.volume.get(i).copied().flatten().unwrap_or(0),
        });
    }

    if bars.is_empty() {
        return None;
    }

    Some(HistorySeries {
        symbol: symbol.to_uppercase(),
        period,
        bars,
    })
}

fn snapshot_from_wire(symbol: &str, result: OptionsResultWire) -> Option<ChainSnapshot> {
    let current_price = result
        .quote
        .as_ref()
        .and_then(|q| q.regular_market_price)
        .unwrap_or_default();

    let period = result.options.into_iter().next()?;
    let expiry = epoch_to_date(period.expiration_date)?;

    let mut calls: Vec<OptionContract> = period.calls.into_iter().map(contract_from_wire).collect();
    let mut puts: Vec<OptionContract> = period.puts.into_iter().map(contract_from_wire).collect();
    calls.sort_by(|a, b| a.strike.total_cmp(&b.strike));
    puts.sort_by(|a, b| a.strike.total_cmp(&b.strike));

    Some(ChainSnapshot {
        symbol: symbol.to_uppercase(),
        expiry,
        current_price,
        calls,
        puts,
    })
}

fn contract_from_wire(wire: ContractWire) -> OptionContract {
    OptionContract {
        strike: wire.strike,
        last_price: wire.last_price,
        bid: wire.bid,
        ask: wire.ask,
        volume: wire.volume,
        open_interest: wire.open_interest,
        implied_volatility: wire.implied_volatility,
    }
}

/// Converts a provider epoch (UTC seconds) to a calendar date.
fn epoch_to_date(epoch: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(epoch, 0).map(|dt| dt.date_naive())
}

/// Converts a calendar date to the provider's epoch representation.
fn date_to_epoch(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_round_trip() {
        for s in [
            "1d", "5d", "1mo", "3mo", "6mo", "1y", "2y", "5y", "10y", "ytd", "max",
        ] {
            let period: HistoryPeriod = s.parse().expect("should parse");
            assert_eq!(period.as_str(), s);
        }
    }

    #[test]
    fn test_period_invalid() {
        let err = "7w".parse::<HistoryPeriod>().unwrap_err();
        assert!(err.contains("Invalid period: 7w"));
    }

    #[test]
    fn test_epoch_date_round_trip() {
        let date = NaiveDate::from_ymd_opt(2025, 12, 5).unwrap();
        assert_eq!(epoch_to_date(date_to_epoch(date)), Some(date));
    }

    #[test]
    fn test_quote_from_wire() {
        let json = r#"{
            "quoteResponse": {
                "result": [{
                    "symbol": "aapl",
                    "longName": "Apple Inc.",
                    "shortName": "Apple",
                    "regularMarketPrice": 182.5,
                    "regularMarketPreviousClose": 180.0,
                    "regularMarketOpen": 181.0,
                    "regularMarketDayHigh": 183.1,
                    "regularMarketDayLow": 180.2,
                    "regularMarketVolume": 51230000,
                    "marketCap": 2810000000000,
                    "currency": "USD",
                    "fullExchangeName": "NasdaqGS"
                }],
                "error": null
            }
        }"#;

        let envelope: QuoteEnvelope = serde_json::from_str(json).unwrap();
        let quote = quote_from_wire(envelope.quote_response.result.into_iter().next().unwrap())
            .expect("should convert");

        assert_eq!(quote.symbol, "AAPL");
        assert_eq!(quote.name.as_deref(), Some("Apple Inc."));
        assert_eq!(quote.current_price, 182.5);
        assert_eq!(quote.volume, Some(51230000));
        assert_eq!(quote.exchange.as_deref(), Some("NasdaqGS"));
    }

    #[test]
    fn test_quote_from_wire_without_price() {
        let wire = QuoteWire {
            symbol: "ZZZZ".to_string(),
            long_name: None,
            short_name: None,
            regular_market_price: None,
            regular_market_previous_close: None,
            regular_market_open: None,
            regular_market_day_high: None,
            regular_market_day_low: None,
            regular_market_volume: None,
            market_cap: None,
            currency: None,
            full_exchange_name: None,
        };
        assert!(quote_from_wire(wire).is_none());
    }

    #[test]
    fn test_series_from_wire_skips_null_rows() {
        let json = r#"{
            "chart": {
                "result": [{
                    "timestamp": [1704067200, 1704153600, 1704240000],
                    "indicators": {
                        "quote": [{
                            "open": [100.0, null, 102.0],
                            "high": [101.0, null, 103.5],
                            "low": [99.5, null, 101.5],
                            "close": [100.5, null, 103.0],
                            "volume": [1000, null, 1500]
                        }]
                    }
                }],
                "error": null
            }
        }"#;

        let envelope: ChartEnvelope = serde_json::from_str(json).unwrap();
        let result = envelope.chart.result.unwrap().into_iter().next().unwrap();
        let series =
            series_from_wire("aapl", HistoryPeriod::OneMonth, result).expect("should convert");

        assert_eq!(series.symbol, "AAPL");
        assert_eq!(series.bars.len(), 2);
        assert_eq!(series.bars[0].close, 100.5);
        assert_eq!(series.bars[1].close, 103.0);
        assert!(series.bars[0].date < series.bars[1].date);
    }

    #[test]
    fn test_snapshot_from_wire() {
        let json = r#"{
            "optionChain": {
                "result": [{
                    "underlyingSymbol": "GOOGL",
                    "expirationDates": [1765065600, 1765670400],
                    "quote": {"regularMarketPrice": 314.89},
                    "options": [{
                        "expirationDate": 1765065600,
                        "calls": [
                            {"strike": 330.0, "lastPrice": 1.2, "openInterest": 19713, "impliedVolatility": 0.31},
                            {"strike": 280.0, "lastPrice": 36.0, "openInterest": 11000, "impliedVolatility": 0.42}
                        ],
                        "puts": [
                            {"strike": 280.0, "lastPrice": 0.8, "openInterest": 11306, "impliedVolatility": 0.39}
                        ]
                    }]
                }]
            }
        }"#;

        let envelope: OptionsEnvelope = serde_json::from_str(json).unwrap();
        let result = envelope.option_chain.result.into_iter().next().unwrap();
        let snapshot = snapshot_from_wire("googl", result).expect("should convert");

        assert_eq!(snapshot.symbol, "GOOGL");
        assert_eq!(snapshot.expiry, NaiveDate::from_ymd_opt(2025, 12, 7).unwrap());
        assert_eq!(snapshot.current_price, 314.89);
        // Calls re-sorted into ascending strike order.
        assert_eq!(snapshot.calls.len(), 2);
        assert_eq!(snapshot.calls[0].strike, 280.0);
        assert_eq!(snapshot.calls[1].strike, 330.0);
        assert_eq!(snapshot.puts[0].open_interest, Some(11306));
    }
}
