//! Application state management.

use crate::config::Config;
use crate::db::{DatabasePool, LedgerStore};
use crate::gateway::MarketData;
use crate::ledger::Ledger;
use std::sync::Arc;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The position ledger service.
    pub ledger: Ledger,
    /// Market data port.
    pub market: Arc<dyn MarketData>,
    /// Application configuration.
    pub config: Config,
}

impl AppState {
    /// Creates the application state from its explicitly constructed parts.
    #[must_use]
    pub fn new(db: &DatabasePool, market: Arc<dyn MarketData>, config: Config) -> Self {
        let ledger = Ledger::new(LedgerStore::new(db.pool().clone()), Arc::clone(&market));

        Self {
            ledger,
            market,
            config,
        }
    }
}
