//! Postgres-backed stock record store.
//!
//! One row per record; the audit history is a JSONB array on the row, so a
//! transaction's quantity change and its history entries land in one `UPDATE`.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation, record-targeted op) | `23505` | `Conflict` |
//! | Database (other) | Any other | `Unavailable` |
//! | PoolClosed / Io / Tls / Other | N/A | `Unavailable` |
//! | Row decode failure | N/A | `Corrupt` |

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::instrument;

use stockwatch_core::StockRecordId;
use stockwatch_inventory::{StockRecord, Transaction};

use super::r#trait::{StockStore, StoreError};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS stock_records (
    id               UUID PRIMARY KEY,
    name             TEXT        NOT NULL,
    quantity         BIGINT      NOT NULL,
    threshold        BIGINT      NOT NULL,
    initial_quantity BIGINT      NOT NULL,
    history          JSONB       NOT NULL DEFAULT '[]'::jsonb,
    created_at       TIMESTAMPTZ NOT NULL,
    updated_at       TIMESTAMPTZ NOT NULL DEFAULT now()
)
"#;

/// Postgres-backed [`StockStore`].
#[derive(Debug, Clone)]
pub struct PostgresStockStore {
    pool: Arc<PgPool>,
}

impl PostgresStockStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect and make sure the `stock_records` table exists.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", None, e))?;
        let store = Self::new(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", None, e))?;
        Ok(())
    }
}

#[async_trait]
impl StockStore for PostgresStockStore {
    #[instrument(skip(self, record), fields(record_id = %record.id()), err)]
    async fn create(&self, record: StockRecord) -> Result<StockRecord, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO stock_records
                (id, name, quantity, threshold, initial_quantity, history, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(record.id().as_uuid())
        .bind(record.name())
        .bind(record.quantity())
        .bind(record.threshold())
        .bind(record.initial_quantity())
        .bind(history_json(&record)?)
        .bind(record.created_at())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create", Some(record.id()), e))?;

        Ok(record)
    }

    #[instrument(skip(self), fields(record_id = %id), err)]
    async fn get_by_id(&self, id: StockRecordId) -> Result<StockRecord, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, quantity, threshold, initial_quantity, history, created_at
            FROM stock_records
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_by_id", Some(id), e))?;

        match row {
            Some(row) => record_from_row(&row),
            None => Err(StoreError::NotFound(id)),
        }
    }

    #[instrument(skip(self, record), fields(record_id = %record.id()), err)]
    async fn update(&self, record: StockRecord) -> Result<StockRecord, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE stock_records
            SET name = $2, quantity = $3, threshold = $4, history = $5, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(record.id().as_uuid())
        .bind(record.name())
        .bind(record.quantity())
        .bind(record.threshold())
        .bind(history_json(&record)?)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update", Some(record.id()), e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(record.id()));
        }
        Ok(record)
    }

    #[instrument(skip(self), fields(record_id = %id), err)]
    async fn delete(&self, id: StockRecordId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM stock_records WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete", Some(id), e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn list_all(&self) -> Result<Vec<StockRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, quantity, threshold, initial_quantity, history, created_at
            FROM stock_records
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_all", None, e))?;

        rows.iter().map(record_from_row).collect()
    }
}

fn history_json(record: &StockRecord) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(record.history())
        .map_err(|e| StoreError::Corrupt(format!("history serialization failed: {e}")))
}

fn record_from_row(row: &sqlx::postgres::PgRow) -> Result<StockRecord, StoreError> {
    let decode = |e: sqlx::Error| StoreError::Corrupt(format!("failed to decode row: {e}"));

    let id: uuid::Uuid = row.try_get("id").map_err(decode)?;
    let name: String = row.try_get("name").map_err(decode)?;
    let quantity: i64 = row.try_get("quantity").map_err(decode)?;
    let threshold: i64 = row.try_get("threshold").map_err(decode)?;
    let initial_quantity: i64 = row.try_get("initial_quantity").map_err(decode)?;
    let history: serde_json::Value = row.try_get("history").map_err(decode)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(decode)?;

    let history: Vec<Transaction> = serde_json::from_value(history)
        .map_err(|e| StoreError::Corrupt(format!("history for {id}: {e}")))?;

    let record = StockRecord::rehydrate(
        StockRecordId::from_uuid(id),
        name,
        initial_quantity,
        threshold,
        created_at,
        history,
    )
    .map_err(|e| StoreError::Corrupt(format!("{id}: {e}")))?;

    // The column is a denormalised copy; the history is authoritative.
    if record.quantity() != quantity {
        return Err(StoreError::Corrupt(format!(
            "{id}: stored quantity {quantity} disagrees with history ({})",
            record.quantity()
        )));
    }

    Ok(record)
}

/// `record` is the id the operation targets; a unique violation is only a
/// `Conflict` when there is one.
fn map_sqlx_error(operation: &str, record: Option<StockRecordId>, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => match (db_err.code().as_deref(), record) {
            (Some("23505"), Some(id)) => StoreError::Conflict(id),
            _ => StoreError::Unavailable(format!(
                "database error in {}: {}",
                operation,
                db_err.message()
            )),
        },
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {operation}"))
        }
        _ => StoreError::Unavailable(format!("sqlx error in {operation}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    #[derive(Debug)]
    struct UniqueViolation;

    impl core::fmt::Display for UniqueViolation {
        fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
            f.write_str("duplicate key value violates unique constraint")
        }
    }

    impl std::error::Error for UniqueViolation {}

    impl sqlx::error::DatabaseError for UniqueViolation {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed("23505"))
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn unique_violation_names_the_conflicting_record() {
        let id = StockRecordId::new();
        let err = map_sqlx_error("create", Some(id), sqlx::Error::Database(Box::new(UniqueViolation)));
        assert_eq!(err, StoreError::Conflict(id));
    }

    #[test]
    fn unique_violation_without_a_record_is_unavailable() {
        let err = map_sqlx_error("ensure_schema", None, sqlx::Error::Database(Box::new(UniqueViolation)));
        assert!(matches!(err, StoreError::Unavailable(msg) if msg.contains("ensure_schema")));
    }

    #[test]
    fn closed_pool_is_unavailable() {
        let err = map_sqlx_error("list_all", None, sqlx::Error::PoolClosed);
        assert!(matches!(err, StoreError::Unavailable(msg) if msg.contains("pool closed")));
    }
}
