use anyhow::Context;

use storefront_api::app::{self, services::ProductServices};
use storefront_infra::config::ProductServiceConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    storefront_observability::init_service("product-service");

    let config = ProductServiceConfig::from_env()?;
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    app::serve(listener, app::build_product_app(ProductServices::in_memory())).await?;
    Ok(())
}
