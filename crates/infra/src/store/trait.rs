use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use stockwatch_core::StockRecordId;
use stockwatch_inventory::StockRecord;

/// Store operation error.
///
/// Infrastructure failures, as opposed to domain errors (validation, invariants).
/// Everything except `NotFound` means the store could not be trusted for the
/// operation and the caller must abort it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("stock record {0} not found")]
    NotFound(StockRecordId),

    #[error("stock record {0} already exists")]
    Conflict(StockRecordId),

    /// Backend unreachable, pool closed, lock poisoned, ...
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A stored row could not be turned back into a valid record.
    #[error("corrupt stock record: {0}")]
    Corrupt(String),
}

/// Durable keyed storage of stock records.
///
/// Implementations persist the whole record (history included) on every write;
/// `update` of an unknown id is `NotFound`, never an implicit insert.
#[async_trait]
pub trait StockStore: Send + Sync {
    async fn create(&self, record: StockRecord) -> Result<StockRecord, StoreError>;

    async fn get_by_id(&self, id: StockRecordId) -> Result<StockRecord, StoreError>;

    async fn update(&self, record: StockRecord) -> Result<StockRecord, StoreError>;

    async fn delete(&self, id: StockRecordId) -> Result<(), StoreError>;

    /// All records, oldest first.
    async fn list_all(&self) -> Result<Vec<StockRecord>, StoreError>;
}

#[async_trait]
impl<S> StockStore for Arc<S>
where
    S: StockStore + ?Sized,
{
    async fn create(&self, record: StockRecord) -> Result<StockRecord, StoreError> {
        (**self).create(record).await
    }

    async fn get_by_id(&self, id: StockRecordId) -> Result<StockRecord, StoreError> {
        (**self).get_by_id(id).await
    }

    async fn update(&self, record: StockRecord) -> Result<StockRecord, StoreError> {
        (**self).update(record).await
    }

    async fn delete(&self, id: StockRecordId) -> Result<(), StoreError> {
        (**self).delete(id).await
    }

    async fn list_all(&self) -> Result<Vec<StockRecord>, StoreError> {
        (**self).list_all().await
    }
}
