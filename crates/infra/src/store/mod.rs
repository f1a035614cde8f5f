//! Stock record persistence boundary.
//!
//! The ledger only talks to [`StockStore`]; what durably holds the records is an
//! adapter choice (in-memory for tests/dev, Postgres behind the `postgres` feature).

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryStockStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresStockStore;
pub use r#trait::{StockStore, StoreError};
