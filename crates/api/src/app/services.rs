use std::sync::Arc;

use stockwatch_alerts::{AlertDispatcher, DispatcherConfig};
use stockwatch_infra::{
    AppConfig, InMemoryStockStore, InventoryLedger, InventoryService, StockStore, external,
};

/// Store-agnostic service handle shared by every handler.
pub type AppServices = InventoryService<Arc<dyn StockStore>>;

/// Wire services from configuration.
///
/// Uses Postgres when built with the `postgres` feature and `DATABASE_URL` is
/// set; otherwise records live in memory for the lifetime of the process.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let store = build_store(config).await?;
    let alerts = Arc::new(AlertDispatcher::new(external::dispatcher_config(config)));
    Ok(InventoryService::new(InventoryLedger::new(store), alerts))
}

/// In-memory store with an explicit dispatcher; used by tests and local runs.
pub fn in_memory_services(alerts: DispatcherConfig) -> AppServices {
    let store: Arc<dyn StockStore> = Arc::new(InMemoryStockStore::new());
    InventoryService::new(
        InventoryLedger::new(store),
        Arc::new(AlertDispatcher::new(alerts)),
    )
}

#[cfg(feature = "postgres")]
async fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn StockStore>> {
    use anyhow::Context;
    use stockwatch_infra::store::postgres::PostgresStockStore;

    let Some(url) = config.database_url.as_deref() else {
        tracing::info!("DATABASE_URL not set; using in-memory store");
        return Ok(Arc::new(InMemoryStockStore::new()));
    };

    let store = PostgresStockStore::connect(url)
        .await
        .context("failed to connect to Postgres")?;
    tracing::info!("using Postgres store");
    Ok(Arc::new(store))
}

#[cfg(not(feature = "postgres"))]
async fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn StockStore>> {
    if config.database_url.is_some() {
        tracing::warn!("DATABASE_URL is set but the postgres feature is disabled; using in-memory store");
    }
    Ok(Arc::new(InMemoryStockStore::new()))
}
