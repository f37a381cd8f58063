//! Position ledger: the transaction log and the derived positions.
//!
//! Positions are never edited directly. Recording a transaction replays the
//! buy/sell onto the current aggregate with [`apply_buy`] / [`apply_sell`]
//! and commits the new aggregate together with the transaction record in
//! one database transaction.
//!
//! Known limitation, preserved on purpose: deleting a transaction does NOT
//! re-derive the position, so the aggregate can drift from the log after an
//! administrative delete.

use crate::db::{
    LedgerStore, NewTransactionRecord, PositionRow, PositionUpsert, TransactionRow,
};
use crate::gateway::MarketData;
use crate::models::TransactionType;
use chrono::{DateTime, Utc};
use futures::future;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Ledger error types.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Selling a symbol that was never bought.
    #[error("Cannot sell {symbol}: No portfolio found")]
    NoPosition {
        /// Symbol being sold.
        symbol: String,
    },

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

    /// Storage failure.
    #[error("ledger storage error: {0}")]
    Store(#[from] sqlx::Error),
}

/// The mutable aggregate of a position: average cost and share count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionState {
    /// Cost-weighted average purchase price.
    pub average_cost: Decimal,
    /// Current share count.
    pub quantity: i64,
}

impl From<&PositionRow> for PositionState {
    fn from(row: &PositionRow) -> Self {
        Self {
            average_cost: row.average_cost,
            quantity: row.quantity,
        }
    }
}

/// Folds a BUY into the aggregate.
///
/// The new average cost is the cost-weighted mean of the old holding and
/// the new shares. A first BUY (or a BUY after selling out) starts the
/// basis at the transaction price.
#[must_use]
pub fn apply_buy(existing: Option<PositionState>, price: Decimal, quantity: i64) -> PositionState {
    match existing {
        Some(pos) => {
            let new_quantity = pos.quantity + quantity;
            let total_cost =
                pos.average_cost * Decimal::from(pos.quantity) + price * Decimal::from(quantity);
            PositionState {
                average_cost: total_cost / Decimal::from(new_quantity),
                quantity: new_quantity,
            }
        }
        None => PositionState {
            average_cost: price,
            quantity,
        },
    }
}

/// Folds a SELL into the aggregate.
///
/// Only the quantity changes; the average cost of the remaining shares is
/// untouched (no lot matching, no realized-gain tracking).
///
/// # Errors
/// Fails when there is no position for the symbol or the held quantity is
/// smaller than the sale.
pub fn apply_sell(
    existing: Option<PositionState>,
    symbol: &str,
    quantity: i64,
) -> Result<PositionState, LedgerError> {
    let Some(pos) = existing else {
        return Err(LedgerError::NoPosition {
            symbol: symbol.to_string(),
        });
    };

    if pos.quantity < quantity {
        return Err(LedgerError::InsufficientPosition {
            symbol: symbol.to_string(),
            requested: quantity,
            available: pos.quantity,
        });
    }

    Ok(PositionState {
        average_cost: pos.average_cost,
        quantity: pos.quantity - quantity,
    })
}

/// Aggregate view over every transaction of one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionSummary {
    /// Symbol the summary covers.
    pub symbol: String,
    /// Total shares bought.
    pub total_bought: i64,
    /// Total shares sold.
    pub total_sold: i64,
    /// Shares still held: bought minus sold.
    pub current_quantity: i64,
    /// Cost-weighted mean over BUY legs only; zero when there are no buys.
    pub average_buy_price: Decimal,
    /// Number of transactions scanned.
    pub transaction_count: i64,
}

/// Computes the summary for a symbol from its transaction rows.
///
/// Returns `None` when there are no rows; a pure read with no side effects.
#[must_use]
pub fn summarize(symbol: &str, rows: &[TransactionRow]) -> Option<TransactionSummary> {
    if rows.is_empty() {
        return None;
    }

    let mut total_bought = 0i64;
    let mut total_sold = 0i64;
    let mut buy_cost = Decimal::ZERO;

    for row in rows {
        match TransactionType::from_db(&row.transaction_type) {
            TransactionType::Buy => {
                total_bought += row.quantity;
                buy_cost += row.price * Decimal::from(row.quantity);
            }
            TransactionType::Sell => total_sold += row.quantity,
        }
    }

    let average_buy_price = if total_bought > 0 {
        buy_cost / Decimal::from(total_bought)
    } else {
        Decimal::ZERO
    };

    Some(TransactionSummary {
        symbol: symbol.to_string(),
        total_bought,
        total_sold,
        current_quantity: total_bought - total_sold,
        average_buy_price,
        transaction_count: rows.len() as i64,
    })
}

/// Input for recording a transaction.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    /// Stock symbol; normalized to uppercase by the ledger.
    pub symbol: String,
    /// BUY or SELL.
    pub transaction_type: TransactionType,
    /// Price per share; validated positive at the API edge.
    pub price: Decimal,
    /// Number of shares; validated positive at the API edge.
    pub quantity: i64,
    /// Trade timestamp; defaults to now.
    pub transaction_date: Option<DateTime<Utc>>,
}

/// Filter for listing transactions.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    /// Restrict to one symbol.
    pub symbol: Option<String>,
    /// Restrict to one transaction type.
    pub transaction_type: Option<TransactionType>,
    /// Maximum rows to return.
    pub limit: i64,
}

/// A position joined with the current market price.
#[derive(Debug, Clone)]
pub struct PositionProfit {
    /// The stored position.
    pub position: PositionRow,
    /// Current price; `None` when the market data provider failed.
    pub current_price: Option<f64>,
    /// Cost basis of the holding.
    pub total_cost: f64,
    /// Market value of the holding, when a price is available.
    pub current_value: Option<f64>,
    /// Unrealized profit or loss, when a price is available.
    pub profit_loss: Option<f64>,
    /// Profit or loss relative to cost, when defined.
    pub profit_loss_percent: Option<f64>,
}

/// The position ledger service.
#[derive(Clone)]
pub struct Ledger {
    store: LedgerStore,
    market: Arc<dyn MarketData>,
}

impl Ledger {
    /// Creates a ledger over a store and a market data port.
    #[must_use]
    pub fn new(store: LedgerStore, market: Arc<dyn MarketData>) -> Self {
        Self { store, market }
    }

    /// Records a buy or sell and updates the position aggregate.
    ///
    /// The position upsert and the transaction insert commit atomically.
    /// On the first BUY of a symbol the display name is fetched from the
    /// market data provider best-effort; a provider failure leaves the name
    /// empty and never blocks the transaction.
    ///
    /// # Errors
    /// Fails on sell-side inventory violations and on storage errors.
    pub async fn record(&self, input: NewTransaction) -> Result<TransactionRow, LedgerError> {
        let symbol = input.symbol.to_uppercase();
        let existing = self.store.position_by_symbol(&symbol).await?;
        let now = Utc::now();

        let state = match input.transaction_type {
            TransactionType::Buy => apply_buy(
                existing.as_ref().map(PositionState::from),
                input.price,
                input.quantity,
            ),
            TransactionType::Sell => apply_sell(
                existing.as_ref().map(PositionState::from),
                &symbol,
                input.quantity,
            )?,
        };

        let name = match &existing {
            Some(position) => position.name.clone(),
            None => self.display_name(&symbol).await,
        };

        let position = PositionUpsert {
            symbol: symbol.clone(),
            name,
            average_cost: state.average_cost,
            quantity: state.quantity,
            created_at: existing.as_ref().map_or(now, |p| p.created_at),
            updated_at: now,
        };

        let record = NewTransactionRecord {
            symbol: symbol.clone(),
            transaction_type: input.transaction_type.as_str().to_string(),
            price: input.price,
            quantity: input.quantity,
            transaction_date: input.transaction_date.unwrap_or(now),
            created_at: now,
        };

        let row = self.store.commit_transaction(&record, &position).await?;
        info!(
            symbol = %symbol,
            transaction_type = %input.transaction_type,
            quantity = input.quantity,
            "transaction recorded"
        );
        Ok(row)
    }

    /// Best-effort display name lookup for a newly created position.
    async fn display_name(&self, symbol: &str) -> Option<String> {
        match self.market.quote(symbol).await {
            Ok(Some(quote)) => quote.name,
            Ok(None) => None,
            Err(err) => {
                warn!(%symbol, error = %err, "display name lookup failed");
                None
            }
        }
    }

    /// Lists transactions newest-first, honoring the filter.
    ///
    /// # Errors
    /// Fails on storage errors.
    pub async fn transactions(
        &self,
        filter: TransactionFilter,
    ) -> Result<Vec<TransactionRow>, LedgerError> {
        let symbol = filter.symbol.map(|s| s.to_uppercase());
        let rows = self
            .store
            .list_transactions(
                symbol.as_deref(),
                filter.transaction_type.map(TransactionType::as_str),
                filter.limit,
            )
            .await?;
        Ok(rows)
    }

    /// Fetches a transaction by id.
    ///
    /// # Errors
    /// Fails on storage errors.
    pub async fn transaction(&self, id: i64) -> Result<Option<TransactionRow>, LedgerError> {
        Ok(self.store.transaction_by_id(id).await?)
    }

    /// Computes the transaction summary for a symbol.
    ///
    /// A pure read: repeated calls without new transactions return the same
    /// result. `None` when the symbol has no transactions.
    ///
    /// # Errors
    /// Fails on storage errors.
    pub async fn summary(&self, symbol: &str) -> Result<Option<TransactionSummary>, LedgerError> {
        let symbol = symbol.to_uppercase();
        let rows = self.store.transactions_by_symbol(&symbol).await?;
        Ok(summarize(&symbol, &rows))
    }

    /// Deletes a transaction row. Returns whether a row was removed.
    ///
    /// Does NOT re-derive the position aggregate; after a delete the ledger
    /// and the log can disagree. Kept as an administrative escape hatch.
    ///
    /// # Errors
    /// Fails on storage errors.
    pub async fn delete(&self, id: i64) -> Result<bool, LedgerError> {
        let deleted = self.store.delete_transaction(id).await?;
        if deleted {
            warn!(id, "transaction deleted; position aggregate not re-derived");
        }
        Ok(deleted)
    }

    /// Lists all positions.
    ///
    /// # Errors
    /// Fails on storage errors.
    pub async fn positions(&self) -> Result<Vec<PositionRow>, LedgerError> {
        Ok(self.store.list_positions().await?)
    }

    /// Fetches the position for a symbol.
    ///
    /// # Errors
    /// Fails on storage errors.
    pub async fn position(&self, symbol: &str) -> Result<Option<PositionRow>, LedgerError> {
        Ok(self
            .store
            .position_by_symbol(&symbol.to_uppercase())
            .await?)
    }

    /// Joins one position with the current market price.
    ///
    /// A provider failure yields a partial result with the price-dependent
    /// fields empty rather than an error.
    pub async fn position_profit(&self, position: PositionRow) -> PositionProfit {
        let current_price = match self.market.quote(&position.symbol).await {
            Ok(Some(quote)) => Some(quote.current_price),
            Ok(None) => None,
            Err(err) => {
                warn!(symbol = %position.symbol, error = %err, "price lookup failed");
                None
            }
        };

        profit_from_price(position, current_price)
    }

    /// Joins every position with current market prices, concurrently.
    ///
    /// # Errors
    /// Fails on storage errors; provider failures degrade to partial rows.
    pub async fn portfolio_profit(&self) -> Result<Vec<PositionProfit>, LedgerError> {
        let positions = self.store.list_positions().await?;
        let profits =
            future::join_all(positions.into_iter().map(|p| self.position_profit(p))).await;
        Ok(profits)
    }
}

/// Derives the profit fields for a position from an optional price.
fn profit_from_price(position: PositionRow, current_price: Option<f64>) -> PositionProfit {
    let quantity = position.quantity as f64;
    let total_cost = position.average_cost.to_f64().unwrap_or_default() * quantity;
    let current_value = current_price.map(|p| p * quantity);
    let profit_loss = current_value.map(|v| v - total_cost);
    let profit_loss_percent = profit_loss.and_then(|pl| {
        if total_cost > 0.0 {
            Some(pl / total_cost * 100.0)
        } else {
            None
        }
    });

    PositionProfit {
        position,
        current_price,
        total_cost,
        current_value,
        profit_loss,
        profit_loss_percent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn state(average_cost: Decimal, quantity: i64) -> PositionState {
        PositionState {
            average_cost,
            quantity,
        }
    }

    fn row(
        id: i64,
        transaction_type: &str,
        price: Decimal,
        quantity: i64,
    ) -> TransactionRow {
        let now = Utc::now();
        TransactionRow {
            id,
            symbol: "X".to_string(),
            transaction_type: transaction_type.to_string(),
            price,
            quantity,
            transaction_date: now,
            created_at: now,
        }
    }

    // ========================================================================
    // apply_buy
    // ========================================================================

    #[test]
    fn test_first_buy_starts_basis_at_price() {
        let result = apply_buy(None, dec!(100), 10);
        assert_eq!(result.average_cost, dec!(100));
        assert_eq!(result.quantity, 10);
    }

    #[test]
    fn test_buy_weighted_average() {
        // BUY 10@100 then BUY 5@150 -> quantity 15, average ~116.67.
        let first = apply_buy(None, dec!(100), 10);
        let second = apply_buy(Some(first), dec!(150), 5);

        assert_eq!(second.quantity, 15);
        assert_eq!(second.average_cost.round_dp(2), dec!(116.67));
    }

    #[test]
    fn test_buy_sequence_matches_cost_weighted_mean() {
        let legs = [(dec!(12.50), 4), (dec!(13.00), 6), (dec!(11.75), 10)];

        let mut state = None;
        let mut total_cost = Decimal::ZERO;
        let mut total_qty = 0i64;
        for (price, qty) in legs {
            state = Some(apply_buy(state, price, qty));
            total_cost += price * Decimal::from(qty);
            total_qty += qty;
        }

        let state = state.unwrap();
        assert_eq!(state.quantity, total_qty);
        assert_eq!(
            state.average_cost.round_dp(6),
            (total_cost / Decimal::from(total_qty)).round_dp(6)
        );
    }

    #[test]
    fn test_buy_after_selling_out_resets_basis() {
        // Quantity 0 with a stale average: the next buy restarts the basis.
        let result = apply_buy(Some(state(dec!(100), 0)), dec!(150), 4);
        assert_eq!(result.average_cost, dec!(150));
        assert_eq!(result.quantity, 4);
    }

    // ========================================================================
    // apply_sell
    // ========================================================================

    #[test]
    fn test_sell_keeps_average_cost() {
        // BUY 10@100 then SELL 5@110 -> quantity 5, average still 100.
        let bought = apply_buy(None, dec!(100), 10);
        let sold = apply_sell(Some(bought), "X", 5).expect("should sell");

        assert_eq!(sold.quantity, 5);
        assert_eq!(sold.average_cost, dec!(100));
    }

    #[test]
    fn test_sell_entire_position() {
        let bought = apply_buy(None, dec!(100), 10);
        let sold = apply_sell(Some(bought), "X", 10).expect("should sell");
        assert_eq!(sold.quantity, 0);
        assert_eq!(sold.average_cost, dec!(100));
    }

    #[test]
    fn test_sell_without_position_fails() {
        let err = apply_sell(None, "TSLA", 5).unwrap_err();
        assert_eq!(err.to_string(), "Cannot sell TSLA: No portfolio found");
    }

    #[test]
    fn test_oversell_fails_naming_available_quantity() {
        let err = apply_sell(Some(state(dec!(100), 3)), "AAPL", 10).unwrap_err();
        match &err {
            LedgerError::InsufficientPosition {
                symbol,
                requested,
                available,
            } => {
                assert_eq!(symbol, "AAPL");
                assert_eq!(*requested, 10);
                assert_eq!(*available, 3);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(
            err.to_string(),
            "Cannot sell 10 shares of AAPL: Only 3 shares available"
        );
    }

    // ========================================================================
    // summarize
    // ========================================================================

    #[test]
    fn test_summarize_empty_is_none() {
        assert!(summarize("X", &[]).is_none());
    }

    #[test]
    fn test_summarize_buy_and_sell_legs() {
        let rows = vec![
            row(1, "BUY", dec!(100), 10),
            row(2, "BUY", dec!(150), 5),
            row(3, "SELL", dec!(170), 4),
        ];

        let summary = summarize("X", &rows).expect("should summarize");
        assert_eq!(summary.symbol, "X");
        assert_eq!(summary.total_bought, 15);
        assert_eq!(summary.total_sold, 4);
        assert_eq!(summary.current_quantity, 11);
        // Sells never move the average buy price.
        assert_eq!(summary.average_buy_price.round_dp(2), dec!(116.67));
        assert_eq!(summary.transaction_count, 3);
    }

    #[test]
    fn test_summarize_without_buys_has_zero_average() {
        let rows = vec![row(1, "SELL", dec!(50), 2)];
        let summary = summarize("X", &rows).expect("should summarize");
        assert_eq!(summary.average_buy_price, Decimal::ZERO);
        assert_eq!(summary.current_quantity, -2);
    }

    #[test]
    fn test_summarize_is_pure() {
        let rows = vec![row(1, "BUY", dec!(100), 10)];
        assert_eq!(summarize("X", &rows), summarize("X", &rows));
    }

    // ========================================================================
    // profit_from_price
    // ========================================================================

    fn position_row(average_cost: Decimal, quantity: i64) -> PositionRow {
        let now = Utc::now();
        PositionRow {
            id: 1,
            symbol: "AAPL".to_string(),
            name: Some("Apple Inc.".to_string()),
            average_cost,
            quantity,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_profit_with_price() {
        let profit = profit_from_price(position_row(dec!(100), 10), Some(110.0));
        assert_eq!(profit.total_cost, 1000.0);
        assert_eq!(profit.current_value, Some(1100.0));
        assert_eq!(profit.profit_loss, Some(100.0));
        assert_eq!(profit.profit_loss_percent, Some(10.0));
    }

    #[test]
    fn test_profit_without_price_is_partial() {
        let profit = profit_from_price(position_row(dec!(100), 10), None);
        assert_eq!(profit.total_cost, 1000.0);
        assert!(profit.current_value.is_none());
        assert!(profit.profit_loss.is_none());
        assert!(profit.profit_loss_percent.is_none());
    }

    #[test]
    fn test_profit_percent_undefined_for_zero_cost() {
        let profit = profit_from_price(position_row(dec!(100), 0), Some(110.0));
        assert_eq!(profit.total_cost, 0.0);
        assert_eq!(profit.profit_loss, Some(0.0));
        assert!(profit.profit_loss_percent.is_none());
    }
}
