//! Postgres-backed stock ledger.
//!
//! Expects an existing table:
//!
//! ```sql
//! CREATE TABLE inventory (
//!     id         BIGSERIAL PRIMARY KEY,
//!     sku_code   TEXT NOT NULL UNIQUE,
//!     quantity   BIGINT NOT NULL CHECK (quantity >= 0),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```
//!
//! ## Atomic reduce
//!
//! `reduce_stock` is one conditional statement:
//! `UPDATE … SET quantity = quantity - $2 WHERE sku_code = $1 AND quantity >= $2`.
//! Postgres row locking serializes concurrent reducers of the same SKU and the
//! second one re-evaluates the guard against the committed quantity. Zero rows
//! updated means either the SKU is missing or stock is short; a follow-up read
//! tells which.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | LedgerError |
//! |------------|----------------------|-------------|
//! | Database (unique violation) | `23505` | `Domain(Conflict)` |
//! | Database (check constraint violation) | `23514` | `Domain(Validation)` |
//! | anything else | | `Storage` |

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::{info, instrument};

use storefront_core::{DomainError, RecordId, SkuCode};
use storefront_inventory::{StockRecord, ensure_requested_quantity, ensure_stock_quantity};

use super::{LedgerError, LedgerResult, StockLedger, id_not_found, sku_not_found};

const RETURNING: &str = "RETURNING id, sku_code, quantity, updated_at";

#[derive(Debug, Clone)]
pub struct PostgresStockLedger {
    pool: Arc<PgPool>,
}

impl PostgresStockLedger {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect a small pool to `database_url`.
    pub async fn connect(database_url: &str) -> LedgerResult<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }
}

fn row_to_record(row: &PgRow) -> LedgerResult<StockRecord> {
    let id: i64 = row.try_get("id").map_err(|e| map_sqlx_error("decode id", e))?;
    let sku: String = row
        .try_get("sku_code")
        .map_err(|e| map_sqlx_error("decode sku_code", e))?;
    let quantity: i64 = row
        .try_get("quantity")
        .map_err(|e| map_sqlx_error("decode quantity", e))?;
    let updated_at: DateTime<Utc> = row
        .try_get("updated_at")
        .map_err(|e| map_sqlx_error("decode updated_at", e))?;

    let sku = SkuCode::parse(sku).map_err(|e| LedgerError::Storage(format!("stored sku is invalid: {e}")))?;
    let id = u64::try_from(id).map_err(|_| LedgerError::Storage(format!("stored id {id} is negative")))?;
    StockRecord::new(RecordId::new(id), sku, quantity, updated_at)
        .map_err(|e| LedgerError::Storage(format!("stored record is invalid: {e}")))
}

fn record_id_param(id: RecordId) -> LedgerResult<i64> {
    i64::try_from(id.value()).map_err(|_| LedgerError::Domain(id_not_found(id)))
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> LedgerError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => LedgerError::Domain(DomainError::conflict(msg)),
                Some("23514") => LedgerError::Domain(DomainError::validation(msg)),
                _ => LedgerError::Storage(msg),
            }
        }
        other => LedgerError::Storage(format!("{operation}: {other}")),
    }
}

#[async_trait::async_trait]
impl StockLedger for PostgresStockLedger {
    #[instrument(skip_all, fields(sku = %sku))]
    async fn add_stock(&self, sku: &SkuCode, quantity: i64) -> LedgerResult<StockRecord> {
        ensure_stock_quantity(quantity)?;
        let sql = format!(
            "INSERT INTO inventory (sku_code, quantity) VALUES ($1, $2) \
             ON CONFLICT (sku_code) DO UPDATE SET quantity = EXCLUDED.quantity, updated_at = NOW() \
             {RETURNING}"
        );
        let row = sqlx::query(&sql)
            .bind(sku.as_str())
            .bind(quantity)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("add_stock", e))?;
        let record = row_to_record(&row)?;
        info!(quantity, id = %record.id_typed(), "inventory added");
        Ok(record)
    }

    #[instrument(skip_all, fields(sku = %sku))]
    async fn reduce_stock(&self, sku: &SkuCode, quantity: i64) -> LedgerResult<StockRecord> {
        ensure_requested_quantity(quantity)?;
        let sql = format!(
            "UPDATE inventory SET quantity = quantity - $2, updated_at = NOW() \
             WHERE sku_code = $1 AND quantity >= $2 {RETURNING}"
        );
        let updated = sqlx::query(&sql)
            .bind(sku.as_str())
            .bind(quantity)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("reduce_stock", e))?;

        if let Some(row) = updated {
            let record = row_to_record(&row)?;
            info!(reduced_by = quantity, remaining = record.quantity(), "stock reduced");
            return Ok(record);
        }

        let available: Option<i64> = sqlx::query_scalar("SELECT quantity FROM inventory WHERE sku_code = $1")
            .bind(sku.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("reduce_stock lookup", e))?;

        match available {
            None => Err(sku_not_found(sku).into()),
            Some(available) => Err(DomainError::insufficient_stock(sku.as_str(), quantity, available).into()),
        }
    }

    async fn is_in_stock(&self, sku: &SkuCode, quantity: i64) -> LedgerResult<bool> {
        ensure_requested_quantity(quantity)?;
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM inventory WHERE sku_code = $1 AND quantity >= $2)")
            .bind(sku.as_str())
            .bind(quantity)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("is_in_stock", e))
    }

    async fn find_by_sku(&self, sku: &SkuCode) -> LedgerResult<Option<StockRecord>> {
        let row = sqlx::query("SELECT id, sku_code, quantity, updated_at FROM inventory WHERE sku_code = $1")
            .bind(sku.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_by_sku", e))?;
        row.as_ref().map(row_to_record).transpose()
    }

    async fn list_stock(&self) -> LedgerResult<Vec<StockRecord>> {
        let rows = sqlx::query("SELECT id, sku_code, quantity, updated_at FROM inventory ORDER BY id")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_stock", e))?;
        rows.iter().map(row_to_record).collect()
    }

    #[instrument(skip_all, fields(id = %id, sku = %sku))]
    async fn update_stock(&self, id: RecordId, sku: &SkuCode, quantity: i64) -> LedgerResult<StockRecord> {
        ensure_stock_quantity(quantity)?;
        let sql = format!(
            "UPDATE inventory SET sku_code = $2, quantity = $3, updated_at = NOW() WHERE id = $1 {RETURNING}"
        );
        let row = sqlx::query(&sql)
            .bind(record_id_param(id)?)
            .bind(sku.as_str())
            .bind(quantity)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_stock", e))?
            .ok_or_else(|| LedgerError::Domain(id_not_found(id)))?;
        let record = row_to_record(&row)?;
        info!(quantity, "inventory updated");
        Ok(record)
    }

    #[instrument(skip_all, fields(id = %id))]
    async fn delete_stock(&self, id: RecordId) -> LedgerResult<StockRecord> {
        let sql = format!("DELETE FROM inventory WHERE id = $1 {RETURNING}");
        let row = sqlx::query(&sql)
            .bind(record_id_param(id)?)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_stock", e))?
            .ok_or_else(|| LedgerError::Domain(id_not_found(id)))?;
        let record = row_to_record(&row)?;
        info!(sku = %record.sku_code(), "inventory deleted");
        Ok(record)
    }
}
