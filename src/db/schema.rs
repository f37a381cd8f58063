//! Database row types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

/// Transaction record from the database. Append-only.
#[derive(Debug, Clone, FromRow)]
pub struct TransactionRow {
    /// Unique identifier.
    pub id: i64,
    /// Stock symbol, uppercased.
    pub symbol: String,
    /// "BUY" or "SELL", backed by a CHECK constraint on the column.
    pub transaction_type: String,
    /// Price per share.
    pub price: Decimal,
    /// Number of shares.
    pub quantity: i64,
    /// When the trade happened.
    pub transaction_date: DateTime<Utc>,
    /// When the record was written.
    pub created_at: DateTime<Utc>,
}

/// Position record from the database. At most one row per symbol.
#[derive(Debug, Clone, FromRow)]
pub struct PositionRow {
    /// Unique identifier.
    pub id: i64,
    /// Stock symbol, uppercased.
    pub symbol: String,
    /// Display name, fetched once from the market data provider.
    pub name: Option<String>,
    /// Cost-weighted average purchase price over BUY legs.
    pub average_cost: Decimal,
    /// Current share count.
    pub quantity: i64,
    /// When the position was first created.
    pub created_at: DateTime<Utc>,
    /// When the position was last recalculated.
    pub updated_at: DateTime<Utc>,
}

/// Values for a new transactions row.
#[derive(Debug, Clone)]
pub struct NewTransactionRecord {
    /// Stock symbol, uppercased.
    pub symbol: String,
    /// "BUY" or "SELL".
    pub transaction_type: String,
    /// Price per share.
    pub price: Decimal,
    /// Number of shares.
    pub quantity: i64,
    /// When the trade happened.
    pub transaction_date: DateTime<Utc>,
    /// When the record is written.
    pub created_at: DateTime<Utc>,
}

/// Values for creating or replacing the aggregate of a positions row.
#[derive(Debug, Clone)]
pub struct PositionUpsert {
    /// Stock symbol, uppercased.
    pub symbol: String,
    /// Display name; only applied when the row is first inserted.
    pub name: Option<String>,
    /// New cost-weighted average purchase price.
    pub average_cost: Decimal,
    /// New share count.
    pub quantity: i64,
    /// Creation timestamp; only applied when the row is first inserted.
    pub created_at: DateTime<Utc>,
    /// Mutation timestamp.
    pub updated_at: DateTime<Utc>,
}
