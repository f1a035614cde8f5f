//! Infrastructure layer: persistence adapters, the inventory ledger, alert
//! transports and configuration.

pub mod config;
pub mod external;
pub mod inventory_service;
pub mod ledger;
pub mod store;

pub use config::{AppConfig, ConfigError, LogFormat};
pub use inventory_service::{InventoryService, TransactionOutcome};
pub use ledger::{AppliedTransaction, InventoryLedger, LedgerError};
pub use store::{InMemoryStockStore, StockStore, StoreError};
