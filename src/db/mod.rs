//! Database module for PostgreSQL connection and operations.

mod pool;
mod schema;
mod store;

pub use pool::DatabasePool;
pub use schema::*;
pub use store::LedgerStore;
