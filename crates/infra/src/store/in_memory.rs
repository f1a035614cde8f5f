use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use stockwatch_core::StockRecordId;
use stockwatch_inventory::StockRecord;

use super::r#trait::{StockStore, StoreError};

/// In-memory stock record store.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryStockStore {
    records: RwLock<HashMap<StockRecordId, StockRecord>>,
}

impl InMemoryStockStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("lock poisoned".to_string())
}

#[async_trait]
impl StockStore for InMemoryStockStore {
    async fn create(&self, record: StockRecord) -> Result<StockRecord, StoreError> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        let id = record.id();
        if records.contains_key(&id) {
            return Err(StoreError::Conflict(id));
        }
        records.insert(id, record.clone());
        Ok(record)
    }

    async fn get_by_id(&self, id: StockRecordId) -> Result<StockRecord, StoreError> {
        let records = self.records.read().map_err(|_| poisoned())?;
        records.get(&id).cloned().ok_or(StoreError::NotFound(id))
    }

    async fn update(&self, record: StockRecord) -> Result<StockRecord, StoreError> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        let id = record.id();
        match records.get_mut(&id) {
            Some(slot) => {
                *slot = record.clone();
                Ok(record)
            }
            None => Err(StoreError::NotFound(id)),
        }
    }

    async fn delete(&self, id: StockRecordId) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        records.remove(&id).map(|_| ()).ok_or(StoreError::NotFound(id))
    }

    async fn list_all(&self) -> Result<Vec<StockRecord>, StoreError> {
        let records = self.records.read().map_err(|_| poisoned())?;
        let mut all: Vec<StockRecord> = records.values().cloned().collect();
        all.sort_by_key(|r| (r.created_at(), r.id()));
        Ok(all)
    }
}
