//! HTTP client for the Stock Portfolio API.

use crate::error::Error;
use crate::types::*;
use reqwest::Client;
use std::time::Duration;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the API (e.g., "http://localhost:8080").
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// HTTP client for the Stock Portfolio API.
#[derive(Debug, Clone)]
pub struct PortfolioClient {
    client: Client,
    base_url: String,
}

impl PortfolioClient {
    /// Creates a new client with the given configuration.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Creates a new client with default configuration.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn with_base_url(base_url: &str) -> Result<Self, Error> {
        Self::new(ClientConfig {
            base_url: base_url.to_string(),
            ..Default::default()
        })
    }

    // ========================================================================
    // Health
    // ========================================================================

    /// Performs a health check.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn health_check(&self) -> Result<HealthResponse, Error> {
        let url = format!("{}/health", self.base_url);
        let resp = self.client.get(&url).send().await?;
        self.handle_response(resp).await
    }

    // ========================================================================
    // Stock
    // ========================================================================

    /// Gets the current quote for a symbol.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn get_stock(&self, symbol: &str) -> Result<StockQuote, Error> {
        let url = format!("{}/stock/{}", self.base_url, symbol);
        let resp = self.client.get(&url).send().await?;
        self.handle_response(resp).await
    }

    /// Gets historical data for a symbol.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn get_stock_history(
        &self,
        symbol: &str,
        period: Option<&str>,
    ) -> Result<StockHistory, Error> {
        let url = format!("{}/stock/{}/history", self.base_url, symbol);
        let mut req = self.client.get(&url);
        if let Some(period) = period {
            req = req.query(&[("period", period)]);
        }
        let resp = req.send().await?;
        self.handle_response(resp).await
    }

    // ========================================================================
    // Transactions
    // ========================================================================

    /// Records a buy or sell transaction.
    ///
    /// # Errors
    /// Returns error if the request fails or the business rule is violated.
    pub async fn create_transaction(
        &self,
        request: &CreateTransactionRequest,
    ) -> Result<Transaction, Error> {
        let url = format!("{}/transaction", self.base_url);
        let resp = self.client.post(&url).json(request).send().await?;
        self.handle_response(resp).await
    }

    /// Lists transactions with optional filters.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn list_transactions(
        &self,
        symbol: Option<&str>,
        transaction_type: Option<TransactionType>,
        limit: Option<i64>,
    ) -> Result<Vec<Transaction>, Error> {
        let url = format!("{}/transaction", self.base_url);
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(symbol) = symbol {
            query.push(("symbol", symbol.to_string()));
        }
        if let Some(ty) = transaction_type {
            query.push(("transaction_type", ty.to_string()));
        }
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }

        let resp = self.client.get(&url).query(&query).send().await?;
        self.handle_response(resp).await
    }

    /// Gets the transaction summary for a symbol.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn get_transaction_summary(
        &self,
        symbol: &str,
    ) -> Result<TransactionSummary, Error> {
        let url = format!("{}/transaction/summary/{}", self.base_url, symbol);
        let resp = self.client.get(&url).send().await?;
        self.handle_response(resp).await
    }

    /// Gets a single transaction by id.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn get_transaction(&self, id: i64) -> Result<Transaction, Error> {
        let url = format!("{}/transaction/{}", self.base_url, id);
        let resp = self.client.get(&url).send().await?;
        self.handle_response(resp).await
    }

    /// Deletes a transaction. The server does not recompute the position.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn delete_transaction(&self, id: i64) -> Result<MessageResponse, Error> {
        let url = format!("{}/transaction/{}", self.base_url, id);
        let resp = self.client.delete(&url).send().await?;
        self.handle_response(resp).await
    }

    // ========================================================================
    // Portfolio
    // ========================================================================

    /// Lists all positions.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn list_portfolio(&self) -> Result<Vec<Position>, Error> {
        let url = format!("{}/portfolio", self.base_url);
        let resp = self.client.get(&url).send().await?;
        self.handle_response(resp).await
    }

    /// Lists all positions with profit/loss.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn get_portfolio_profit(&self) -> Result<Vec<PositionProfit>, Error> {
        let url = format!("{}/portfolio/profit", self.base_url);
        let resp = self.client.get(&url).send().await?;
        self.handle_response(resp).await
    }

    /// Gets the position for a symbol.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn get_position(&self, symbol: &str) -> Result<Position, Error> {
        let url = format!("{}/portfolio/{}", self.base_url, symbol);
        let resp = self.client.get(&url).send().await?;
        self.handle_response(resp).await
    }

    /// Gets the position for a symbol with profit/loss.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn get_position_profit(&self, symbol: &str) -> Result<PositionProfit, Error> {
        let url = format!("{}/portfolio/{}/profit", self.base_url, symbol);
        let resp = self.client.get(&url).send().await?;
        self.handle_response(resp).await
    }

    // ========================================================================
    // Options
    // ========================================================================

    /// Gets the listed option expiries for a symbol.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn get_option_expiries(&self, symbol: &str) -> Result<ExpiryList, Error> {
        let url = format!("{}/option/{}/expiry", self.base_url, symbol);
        let resp = self.client.get(&url).send().await?;
        self.handle_response(resp).await
    }

    /// Gets the max pain analysis for a symbol.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn get_max_pain(
        &self,
        symbol: &str,
        expiry: Option<&str>,
    ) -> Result<MaxPain, Error> {
        self.get_with_expiry(&format!("{}/option/{}/max-pain", self.base_url, symbol), expiry)
            .await
    }

    /// Gets the put/call ratio for a symbol.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn get_put_call_ratio(
        &self,
        symbol: &str,
        expiry: Option<&str>,
    ) -> Result<PutCallRatio, Error> {
        self.get_with_expiry(&format!("{}/option/{}/pcr", self.base_url, symbol), expiry)
            .await
    }

    /// Gets the ATM implied volatility for a symbol.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn get_atm_iv(
        &self,
        symbol: &str,
        expiry: Option<&str>,
    ) -> Result<AtmImpliedVolatility, Error> {
        self.get_with_expiry(&format!("{}/option/{}/iv", self.base_url, symbol), expiry)
            .await
    }

    /// Gets the full option chain for a symbol.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn get_option_chain(
        &self,
        symbol: &str,
        expiry: Option<&str>,
    ) -> Result<OptionChain, Error> {
        self.get_with_expiry(&format!("{}/option/{}/chain", self.base_url, symbol), expiry)
            .await
    }

    // ========================================================================
    // Internals
    // ========================================================================

    async fn get_with_expiry<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        expiry: Option<&str>,
    ) -> Result<T, Error> {
        let mut req = self.client.get(url);
        if let Some(expiry) = expiry {
            req = req.query(&[("expiry", expiry)]);
        }
        let resp = req.send().await?;
        self.handle_response(resp).await
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();

        if status.is_success() {
            Ok(resp.json().await?)
        } else if status.as_u16() == 404 {
            let text = resp.text().await.unwrap_or_default();
            Err(Error::NotFound(text))
        } else {
            let text = resp.text().await.unwrap_or_default();
            Err(Error::Api {
                status: status.as_u16(),
                message: text,
            })
        }
    }
}
