//! Ledger storage port over PostgreSQL.
//!
//! All ledger persistence goes through this repository so the business
//! logic never touches SQL directly. [`LedgerStore::commit_transaction`]
//! is the one write path: it applies the position aggregate and appends
//! the transaction record inside a single database transaction.

use crate::db::schema::{NewTransactionRecord, PositionRow, PositionUpsert, TransactionRow};
use sqlx::PgPool;

const TRANSACTION_COLUMNS: &str =
    "id, symbol, transaction_type, price, quantity, transaction_date, created_at";

const POSITION_COLUMNS: &str =
    "id, symbol, name, average_cost, quantity, created_at, updated_at";

/// Repository for transaction and position rows.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    pool: PgPool,
}

impl LedgerStore {
    /// Creates a new repository instance.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetches the position for a symbol, if one exists.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn position_by_symbol(
        &self,
        symbol: &str,
    ) -> Result<Option<PositionRow>, sqlx::Error> {
        sqlx::query_as::<_, PositionRow>(&format!(
            "SELECT {POSITION_COLUMNS} FROM positions WHERE symbol = $1"
        ))
        .bind(symbol)
        .fetch_optional(&self.pool)
        .await
    }

    /// Lists all positions in symbol order.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn list_positions(&self) -> Result<Vec<PositionRow>, sqlx::Error> {
        sqlx::query_as::<_, PositionRow>(&format!(
            "SELECT {POSITION_COLUMNS} FROM positions ORDER BY symbol"
        ))
        .fetch_all(&self.pool)
        .await
    }

    /// Atomically applies a position aggregate and appends the transaction
    /// record. Either both writes commit or neither does.
    ///
    /// # Errors
    /// Returns an error if any statement or the commit fails; the database
    /// transaction rolls back on drop in that case.
    pub async fn commit_transaction(
        &self,
        record: &NewTransactionRecord,
        position: &PositionUpsert,
    ) -> Result<TransactionRow, sqlx::Error> {
        let mut db_tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO positions (symbol, name, average_cost, quantity, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (symbol) DO UPDATE
                SET average_cost = EXCLUDED.average_cost,
                    quantity = EXCLUDED.quantity,
                    updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&position.symbol)
        .bind(&position.name)
        .bind(position.average_cost)
        .bind(position.quantity)
        .bind(position.created_at)
        .bind(position.updated_at)
        .execute(&mut *db_tx)
        .await?;

        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            r#"
            INSERT INTO transactions
                (symbol, transaction_type, price, quantity, transaction_date, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {TRANSACTION_COLUMNS}
            "#
        ))
        .bind(&record.symbol)
        .bind(&record.transaction_type)
        .bind(record.price)
        .bind(record.quantity)
        .bind(record.transaction_date)
        .bind(record.created_at)
        .fetch_one(&mut *db_tx)
        .await?;

        db_tx.commit().await?;

        Ok(row)
    }

    /// Lists transactions newest-first with optional symbol and type filters.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn list_transactions(
        &self,
        symbol: Option<&str>,
        transaction_type: Option<&str>,
        limit: i64,
    ) -> Result<Vec<TransactionRow>, sqlx::Error> {
        match (symbol, transaction_type) {
            (Some(symbol), Some(ty)) => {
                sqlx::query_as::<_, TransactionRow>(&format!(
                    "SELECT {TRANSACTION_COLUMNS} FROM transactions \
                     WHERE symbol = $1 AND transaction_type = $2 \
                     ORDER BY transaction_date DESC LIMIT $3"
                ))
                .bind(symbol)
                .bind(ty)
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
            (Some(symbol), None) => {
                sqlx::query_as::<_, TransactionRow>(&format!(
                    "SELECT {TRANSACTION_COLUMNS} FROM transactions \
                     WHERE symbol = $1 \
                     ORDER BY transaction_date DESC LIMIT $2"
                ))
                .bind(symbol)
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
            (None, Some(ty)) => {
                sqlx::query_as::<_, TransactionRow>(&format!(
                    "SELECT {TRANSACTION_COLUMNS} FROM transactions \
                     WHERE transaction_type = $1 \
                     ORDER BY transaction_date DESC LIMIT $2"
                ))
                .bind(ty)
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
            (None, None) => {
                sqlx::query_as::<_, TransactionRow>(&format!(
                    "SELECT {TRANSACTION_COLUMNS} FROM transactions \
                     ORDER BY transaction_date DESC LIMIT $1"
                ))
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
        }
    }

    /// Fetches a single transaction by id.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn transaction_by_id(&self, id: i64) -> Result<Option<TransactionRow>, sqlx::Error> {
        sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Fetches every transaction for a symbol in trade-date order.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn transactions_by_symbol(
        &self,
        symbol: &str,
    ) -> Result<Vec<TransactionRow>, sqlx::Error> {
        sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions \
             WHERE symbol = $1 ORDER BY transaction_date"
        ))
        .bind(symbol)
        .fetch_all(&self.pool)
        .await
    }

    /// Deletes a transaction row. Returns whether a row was removed.
    ///
    /// The position aggregate is intentionally left untouched; see the
    /// ledger documentation for the resulting drift.
    ///
    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn delete_transaction(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
