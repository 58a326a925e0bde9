use anyhow::Context;

use storefront_api::app::{self, services};
use storefront_infra::config::InventoryServiceConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    storefront_observability::init_service("inventory-service");

    let config = InventoryServiceConfig::from_env()?;
    let services = services::build_inventory_services(&config)
        .await
        .context("failed to set up the stock ledger")?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    app::serve(listener, app::build_inventory_app(services)).await?;
    Ok(())
}
