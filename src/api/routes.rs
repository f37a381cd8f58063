//! Route configuration.

use crate::api::handlers;
use crate::state::AppState;
use axum::Router;
use axum::routing::get;
use std::sync::Arc;

/// Creates the API router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Stock quotes and history
        .route("/stock/{symbol}", get(handlers::get_stock))
        .route("/stock/{symbol}/history", get(handlers::get_stock_history))
        // Transactions
        .route(
            "/transaction",
            get(handlers::list_transactions).post(handlers::create_transaction),
        )
        .route(
            "/transaction/summary/{symbol}",
            get(handlers::get_transaction_summary),
        )
        .route(
            "/transaction/{id}",
            get(handlers::get_transaction).delete(handlers::delete_transaction),
        )
        // Portfolio (read-only; positions change only through transactions)
        .route("/portfolio", get(handlers::list_portfolio))
        .route("/portfolio/profit", get(handlers::get_portfolio_profit))
        .route("/portfolio/{symbol}", get(handlers::get_position))
        .route(
            "/portfolio/{symbol}/profit",
            get(handlers::get_position_profit),
        )
        // Options analytics
        .route("/option/{symbol}/expiry", get(handlers::get_option_expiries))
        .route("/option/{symbol}/max-pain", get(handlers::get_max_pain))
        .route("/option/{symbol}/pcr", get(handlers::get_put_call_ratio))
        .route("/option/{symbol}/iv", get(handlers::get_atm_iv))
        .route("/option/{symbol}/chain", get(handlers::get_option_chain))
        .with_state(state)
}
