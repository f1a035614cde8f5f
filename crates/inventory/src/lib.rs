//! Inventory domain module.
//!
//! Stock records, their audited transaction history and the low-stock predicate,
//! implemented as deterministic domain logic (no IO, no async, no storage).

pub mod record;
pub mod threshold;

pub use record::{AdjustStock, NewStockRecord, StockRecord, Transaction};
pub use threshold::is_low;
