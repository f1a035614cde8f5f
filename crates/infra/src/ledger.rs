//! Inventory ledger: the only writer path for stock records.
//!
//! ```text
//! apply_transaction(id, amounts)
//!   ↓
//! 1. Acquire the record's lock (other records proceed in parallel)
//!   ↓
//! 2. Load the record from the store
//!   ↓
//! 3. Apply the adjustment (pure domain logic, validates amounts)
//!   ↓
//! 4. Write the record back (quantity + appended history in one write)
//!   ↓
//! 5. Evaluate the threshold on the persisted state
//! ```
//!
//! Any failure before step 4 completes leaves the stored record untouched.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use thiserror::Error;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

use stockwatch_core::{DomainError, StockRecordId};
use stockwatch_inventory::{AdjustStock, NewStockRecord, StockRecord, is_low};

use crate::store::{StockStore, StoreError};

#[derive(Debug, Error)]
pub enum LedgerError {
    /// Unknown record id.
    #[error("stock record not found")]
    NotFound,

    /// Malformed input (negative or non-whole amount, empty name, overflow).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The store failed; the operation was aborted.
    #[error("store failure: {0}")]
    Store(StoreError),
}

impl From<DomainError> for LedgerError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::InvalidArgument(msg) => LedgerError::InvalidArgument(msg),
            DomainError::InvalidId(msg) => LedgerError::InvalidArgument(msg),
            DomainError::NotFound => LedgerError::NotFound,
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(_) => LedgerError::NotFound,
            other => LedgerError::Store(other),
        }
    }
}

/// A committed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedTransaction {
    /// The record as persisted.
    pub record: StockRecord,
    /// Persisted quantity is strictly below the record's threshold.
    pub crossed_below_threshold: bool,
    /// History entries added by this call (0, 1 or 2).
    pub entries_appended: usize,
}

/// Per-record mutual exclusion.
///
/// Entries are created on demand and dropped again once nobody holds or waits for
/// them, so the map only ever contains records with in-flight operations.
#[derive(Debug, Default)]
struct RecordLocks {
    inner: Mutex<HashMap<StockRecordId, Arc<AsyncMutex<()>>>>,
}

/// Exclusive access to one record. Dropping it releases the lock and prunes the
/// table, including when the owning future is cancelled mid-operation.
struct RecordLease<'a> {
    locks: &'a RecordLocks,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for RecordLease<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks.prune();
    }
}

impl RecordLocks {
    async fn acquire(&self, id: StockRecordId) -> Result<RecordLease<'_>, StoreError> {
        // Declared before the wait so that a cancelled waiter still prunes.
        let mut lease = RecordLease {
            locks: self,
            guard: None,
        };
        let lock = {
            let mut map = self
                .inner
                .lock()
                .map_err(|_| StoreError::Unavailable("record lock table poisoned".to_string()))?;
            Arc::clone(map.entry(id).or_default())
        };
        lease.guard = Some(lock.lock_owned().await);
        Ok(lease)
    }

    /// Drop every entry that only the table still references.
    fn prune(&self) {
        if let Ok(mut map) = self.inner.lock() {
            map.retain(|_, lock| Arc::strong_count(lock) > 1);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.lock().map(|m| m.len()).unwrap_or(0)
    }
}

/// Sole authority for mutating stock records.
///
/// Read-modify-write sequences on the same record are serialized; sequences on
/// different records run concurrently.
#[derive(Debug)]
pub struct InventoryLedger<S> {
    store: S,
    locks: RecordLocks,
}

impl<S> InventoryLedger<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: RecordLocks::default(),
        }
    }
}

impl<S> InventoryLedger<S>
where
    S: StockStore,
{
    /// Create a record with empty history.
    pub async fn create_record(&self, cmd: NewStockRecord) -> Result<StockRecord, LedgerError> {
        let record = StockRecord::create(StockRecordId::new(), &cmd, Utc::now())?;
        let record = self.store.create(record).await?;
        debug!(record_id = %record.id(), name = %record.name(), quantity = record.quantity(), "stock record created");
        Ok(record)
    }

    pub async fn get_record(&self, id: StockRecordId) -> Result<StockRecord, LedgerError> {
        Ok(self.store.get_by_id(id).await?)
    }

    pub async fn list_records(&self) -> Result<Vec<StockRecord>, LedgerError> {
        Ok(self.store.list_all().await?)
    }

    /// Apply a consumption and/or restock to a record and persist it.
    ///
    /// A call without any non-zero amount still writes the record back and still
    /// reports the threshold state.
    pub async fn apply_transaction(
        &self,
        id: StockRecordId,
        cmd: AdjustStock,
    ) -> Result<AppliedTransaction, LedgerError> {
        let _lease = self.locks.acquire(id).await?;
        self.apply_locked(id, cmd).await
    }

    async fn apply_locked(
        &self,
        id: StockRecordId,
        cmd: AdjustStock,
    ) -> Result<AppliedTransaction, LedgerError> {
        let mut record = self.store.get_by_id(id).await?;
        let entries_appended = record.apply(&cmd, Utc::now())?;
        let record = self.store.update(record).await?;
        let crossed_below_threshold = is_low(record.quantity(), record.threshold());

        debug!(
            record_id = %id,
            quantity = record.quantity(),
            threshold = record.threshold(),
            entries_appended,
            crossed_below_threshold,
            "stock transaction applied"
        );

        Ok(AppliedTransaction {
            record,
            crossed_below_threshold,
            entries_appended,
        })
    }

    /// Remove a record and its history.
    pub async fn delete_record(&self, id: StockRecordId) -> Result<(), LedgerError> {
        {
            let _lease = self.locks.acquire(id).await?;
            self.store.delete(id).await?;
        }
        debug!(record_id = %id, "stock record deleted");
        Ok(())
    }
}
