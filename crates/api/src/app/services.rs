//! Service wiring: which ledger, store and inventory client each service runs on.

use std::sync::Arc;

use storefront_infra::config::{InventoryClientConfig, InventoryServiceConfig};
use storefront_infra::inventory_client::{HttpInventoryClient, InventoryApi, InventoryCallError, ResilientInventoryClient};
use storefront_infra::ledger::{InMemoryStockLedger, LedgerResult, StockLedger};
use storefront_infra::record_store::InMemoryRecordStore;
use storefront_infra::{OrderPlacement, ProductCatalog};
use storefront_orders::Order;
use storefront_products::Product;

/// Inventory client used by the order service.
pub type InventoryGateway = ResilientInventoryClient<Arc<dyn InventoryApi>>;

pub type OrderStore = Arc<InMemoryRecordStore<Order>>;

pub struct InventoryServices {
    pub ledger: Arc<dyn StockLedger>,
}

impl InventoryServices {
    pub fn new(ledger: Arc<dyn StockLedger>) -> Self {
        Self { ledger }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryStockLedger::new()))
    }
}

pub struct OrderServices {
    pub placement: OrderPlacement<OrderStore, Arc<InventoryGateway>>,
    pub inventory: Arc<InventoryGateway>,
}

impl OrderServices {
    pub fn new(inventory: Arc<InventoryGateway>) -> Self {
        let placement = OrderPlacement::new(Arc::new(InMemoryRecordStore::new()), inventory.clone());
        Self { placement, inventory }
    }

    /// Order service talking to the inventory service over HTTP.
    pub fn from_config(config: &InventoryClientConfig) -> Result<Self, InventoryCallError> {
        let http: Arc<dyn InventoryApi> = Arc::new(HttpInventoryClient::new(config.base_url.clone(), config.timeout)?);
        let gateway = ResilientInventoryClient::with_settings(
            http,
            config.retry.clone(),
            config.breaker.clone(),
            config.failure_policy,
        );
        Ok(Self::new(Arc::new(gateway)))
    }
}

pub struct ProductServices {
    pub catalog: ProductCatalog<InMemoryRecordStore<Product>>,
}

impl ProductServices {
    pub fn in_memory() -> Self {
        Self {
            catalog: ProductCatalog::new(InMemoryRecordStore::new()),
        }
    }
}

/// Pick the stock ledger for the inventory service.
pub async fn build_inventory_services(config: &InventoryServiceConfig) -> LedgerResult<InventoryServices> {
    match config.database_url.as_deref() {
        #[cfg(feature = "postgres")]
        Some(url) => {
            let ledger = storefront_infra::ledger::PostgresStockLedger::connect(url).await?;
            tracing::info!("using postgres stock ledger");
            Ok(InventoryServices::new(Arc::new(ledger)))
        }
        #[cfg(not(feature = "postgres"))]
        Some(_) => {
            tracing::warn!("DATABASE_URL is set but postgres support is not compiled in; using in-memory ledger");
            Ok(InventoryServices::in_memory())
        }
        None => {
            tracing::info!("using in-memory stock ledger");
            Ok(InventoryServices::in_memory())
        }
    }
}
