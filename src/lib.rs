//! # Stock Portfolio Backend - REST API Server
//!
//! A REST API backend for live stock quotes, options analytics and a
//! personal holdings ledger. Built with [Axum](https://crates.io/crates/axum)
//! for async HTTP handling, [SQLx](https://crates.io/crates/sqlx) for
//! PostgreSQL persistence, and provides OpenAPI/Swagger documentation via
//! [utoipa](https://crates.io/crates/utoipa).
//!
//! ## Key Features
//!
//! - **Holdings Ledger**: Append-only buy/sell transaction log with one
//!   derived average-cost position per symbol, updated atomically with
//!   every transaction.
//!
//! - **Options Analytics**: Max pain, put/call ratio and at-the-money
//!   implied volatility computed over live option chains.
//!
//! - **Market Data Proxy**: Current quotes and historical OHLCV series
//!   fetched from the upstream provider with bounded timeouts.
//!
//! - **OpenAPI Documentation**: Auto-generated Swagger UI for API
//!   exploration and testing at `/swagger-ui/`.
//!
//! - **Structured Logging**: Request tracing with `tower-http` for
//!   debugging and monitoring.
//!
//! ## Module Structure
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`api`] | Route handlers and router configuration |
//! | [`config`] | TOML configuration with environment overrides |
//! | [`db`] | Connection pool, row types and the ledger storage port |
//! | [`error`] | API error types with `IntoResponse` implementation |
//! | [`gateway`] | Upstream market data port and Yahoo Finance client |
//! | [`ledger`] | Transaction replay logic and position aggregates |
//! | [`models`] | Request/response DTOs with OpenAPI schemas |
//! | [`options`] | Pure options analytics over chain snapshots |
//! | [`state`] | Application state management |
//!
//! ## API Endpoints
//!
//! ### Health & Stock
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/health` | Health check |
//! | GET | `/stock/{symbol}` | Current quote |
//! | GET | `/stock/{symbol}/history?period=` | Historical OHLCV data |
//!
//! ### Transactions
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | POST | `/transaction` | Record a buy or sell |
//! | GET | `/transaction` | List transactions (filters, newest first) |
//! | GET | `/transaction/summary/{symbol}` | Per-symbol summary |
//! | GET | `/transaction/{id}` | Single transaction |
//! | DELETE | `/transaction/{id}` | Delete (does not recompute the position) |
//!
//! ### Portfolio
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/portfolio` | All positions |
//! | GET | `/portfolio/profit` | All positions with profit/loss |
//! | GET | `/portfolio/{symbol}` | Single position |
//! | GET | `/portfolio/{symbol}/profit` | Single position with profit/loss |
//!
//! ### Options
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/option/{symbol}/expiry` | Listed expiries |
//! | GET | `/option/{symbol}/max-pain?expiry=` | Max pain analysis |
//! | GET | `/option/{symbol}/pcr?expiry=` | Put/call ratio |
//! | GET | `/option/{symbol}/iv?expiry=` | ATM implied volatility |
//! | GET | `/option/{symbol}/chain?expiry=` | Full option chain |
//!
//! ## Example Usage
//!
//! ### Starting the Server
//!
//! ```bash
//! # Development mode (config.toml in the working directory, or defaults)
//! DATABASE_URL=postgres://localhost/portfolio cargo run
//!
//! # With custom host/port
//! HOST=127.0.0.1 PORT=3000 cargo run
//! ```
//!
//! ### API Requests
//!
//! ```bash
//! # Buy 10 shares of AAPL at 180.50
//! curl -X POST http://localhost:8080/transaction \
//!   -H "Content-Type: application/json" \
//!   -d '{"symbol": "AAPL", "transaction_type": "BUY", "price": 180.50, "quantity": 10}'
//!
//! # Sell 5 of them
//! curl -X POST http://localhost:8080/transaction \
//!   -H "Content-Type: application/json" \
//!   -d '{"symbol": "AAPL", "transaction_type": "SELL", "price": 185.00, "quantity": 5}'
//!
//! # Portfolio with live profit/loss
//! curl http://localhost:8080/portfolio/profit
//!
//! # Max pain for the nearest GOOGL expiry
//! curl http://localhost:8080/option/GOOGL/max-pain
//! ```
//!
//! ## Ledger Semantics
//!
//! A BUY folds into the position's cost-weighted average; a SELL only
//! decrements the quantity and fails when the inventory is short. Deleting
//! a transaction does NOT re-derive the position - the delete endpoint is
//! an administrative escape hatch and the resulting drift is a documented
//! limitation.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod ledger;
pub mod models;
pub mod options;
pub mod state;
