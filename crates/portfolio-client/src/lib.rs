//! HTTP client library for the Stock Portfolio API.
//!
//! This crate provides a typed HTTP client for interacting with the stock
//! portfolio backend: quotes, history, the transaction ledger, portfolio
//! views and options analytics.
//!
//! # Example
//!
//! ```no_run
//! use portfolio_client::{ClientConfig, PortfolioClient};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), portfolio_client::Error> {
//!     let client = PortfolioClient::new(ClientConfig {
//!         base_url: "http://localhost:8080".into(),
//!         timeout: Duration::from_secs(30),
//!     })?;
//!
//!     // Check health
//!     let health = client.health_check().await?;
//!     println!("Status: {}", health.status);
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod types;

pub use client::{ClientConfig, PortfolioClient};
pub use error::Error;
pub use types::*;
