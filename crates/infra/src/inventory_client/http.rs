use std::time::Duration;

use reqwest::Response;

use storefront_core::SkuCode;

use super::{InventoryApi, InventoryCallError};

/// Inventory service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpInventoryClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpInventoryClient {
    /// `timeout` bounds each request (connect included).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, InventoryCallError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| InventoryCallError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn stock_query(sku: &SkuCode, quantity: i64) -> [(&'static str, String); 2] {
    [("skuCode", sku.as_str().to_string()), ("quantity", quantity.to_string())]
}

fn transport_error(err: reqwest::Error) -> InventoryCallError {
    if err.is_timeout() {
        InventoryCallError::Transport(format!("timed out: {err}"))
    } else {
        InventoryCallError::Transport(err.to_string())
    }
}

async fn ensure_success(resp: Response) -> Result<Response, InventoryCallError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    Err(InventoryCallError::Status {
        status: status.as_u16(),
        body: resp.text().await.unwrap_or_default(),
    })
}

#[async_trait::async_trait]
impl InventoryApi for HttpInventoryClient {
    async fn is_in_stock(&self, sku: &SkuCode, quantity: i64) -> Result<bool, InventoryCallError> {
        let resp = self
            .client
            .get(self.url("/api/inventory/stock"))
            .query(&stock_query(sku, quantity))
            .send()
            .await
            .map_err(transport_error)?;
        let resp = ensure_success(resp).await?;
        resp.json::<bool>()
            .await
            .map_err(|e| InventoryCallError::Decode(e.to_string()))
    }

    async fn reduce_stock(&self, sku: &SkuCode, quantity: i64) -> Result<(), InventoryCallError> {
        let resp = self
            .client
            .post(self.url("/api/inventory/reduce"))
            .query(&stock_query(sku, quantity))
            .send()
            .await
            .map_err(transport_error)?;
        ensure_success(resp).await?;
        Ok(())
    }
}
