use anyhow::Context;

use storefront_api::app::{self, services::OrderServices};
use storefront_infra::config::OrderServiceConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    storefront_observability::init_service("order-service");

    let config = OrderServiceConfig::from_env()?;
    tracing::info!(
        inventory_url = %config.inventory.base_url,
        failure_policy = ?config.inventory.failure_policy,
        "inventory client configured"
    );
    let services = OrderServices::from_config(&config.inventory).context("failed to build inventory client")?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    app::serve(listener, app::build_order_app(services)).await?;
    Ok(())
}
