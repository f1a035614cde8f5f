//! Application-level orchestration: ledger first, alerts after commit.
//!
//! The transaction's success is decided by the ledger alone. When the committed
//! quantity is below threshold, the alert fan-out is spawned as a detached task
//! and the caller gets the updated record without waiting for delivery.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::info;

use stockwatch_alerts::{AlertDispatcher, DispatchReport, LowStockAlert};
use stockwatch_core::StockRecordId;
use stockwatch_inventory::{AdjustStock, NewStockRecord, StockRecord};

use crate::ledger::{InventoryLedger, LedgerError};
use crate::store::StockStore;

/// Result of [`InventoryService::record_transaction`].
#[derive(Debug)]
pub struct TransactionOutcome {
    pub record: StockRecord,
    pub crossed_below_threshold: bool,
    /// Handle on the detached alert fan-out, present iff an alert was raised.
    ///
    /// Dropping it does not cancel delivery.
    pub alert: Option<JoinHandle<DispatchReport>>,
}

/// Ledger + alert dispatcher wiring used by the API.
#[derive(Debug)]
pub struct InventoryService<S> {
    ledger: InventoryLedger<S>,
    alerts: Arc<AlertDispatcher>,
}

impl<S> InventoryService<S>
where
    S: StockStore,
{
    pub fn new(ledger: InventoryLedger<S>, alerts: Arc<AlertDispatcher>) -> Self {
        Self { ledger, alerts }
    }

    pub async fn create_record(&self, cmd: NewStockRecord) -> Result<StockRecord, LedgerError> {
        self.ledger.create_record(cmd).await
    }

    pub async fn get_record(&self, id: StockRecordId) -> Result<StockRecord, LedgerError> {
        self.ledger.get_record(id).await
    }

    pub async fn list_records(&self) -> Result<Vec<StockRecord>, LedgerError> {
        self.ledger.list_records().await
    }

    pub async fn delete_record(&self, id: StockRecordId) -> Result<(), LedgerError> {
        self.ledger.delete_record(id).await
    }

    /// Apply a transaction; raise a low-stock alert if the result is below threshold.
    ///
    /// Must be called from within a tokio runtime (the alert runs on a spawned task).
    pub async fn record_transaction(
        &self,
        id: StockRecordId,
        cmd: AdjustStock,
    ) -> Result<TransactionOutcome, LedgerError> {
        let applied = self.ledger.apply_transaction(id, cmd).await?;

        let alert = if applied.crossed_below_threshold {
            info!(
                record_id = %id,
                quantity = applied.record.quantity(),
                threshold = applied.record.threshold(),
                channels = self.alerts.channel_count(),
                "stock below threshold; dispatching alert"
            );
            Some(self.alerts.spawn(LowStockAlert::from(&applied.record)))
        } else {
            None
        };

        Ok(TransactionOutcome {
            record: applied.record,
            crossed_below_threshold: applied.crossed_below_threshold,
            alert,
        })
    }
}
