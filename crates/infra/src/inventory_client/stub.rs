use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use storefront_core::SkuCode;

use super::{InventoryApi, InventoryCallError};

/// Scripted inventory for tests: a stock table, injectable failures and
/// call counters.
#[derive(Debug, Default)]
pub struct StubInventoryApi {
    stock: Mutex<HashMap<String, i64>>,
    scripted: Mutex<VecDeque<InventoryCallError>>,
    persistent: Mutex<Option<InventoryCallError>>,
    stalled: AtomicBool,
    check_calls: AtomicU32,
    reduce_calls: AtomicU32,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl StubInventoryApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stock(self, sku: &str, quantity: i64) -> Self {
        self.set_stock(sku, quantity);
        self
    }

    pub fn set_stock(&self, sku: &str, quantity: i64) {
        lock(&self.stock).insert(sku.to_string(), quantity);
    }

    pub fn stock_of(&self, sku: &str) -> Option<i64> {
        lock(&self.stock).get(sku).copied()
    }

    /// The next `times` calls (of either kind) fail with `err`.
    pub fn fail_next(&self, times: usize, err: InventoryCallError) {
        let mut scripted = lock(&self.scripted);
        scripted.extend(std::iter::repeat_n(err, times));
    }

    /// Every call fails with `err` until `recover`.
    pub fn fail_always(&self, err: InventoryCallError) {
        *lock(&self.persistent) = Some(err);
    }

    /// Every call hangs until `recover`.
    pub fn stall(&self) {
        self.stalled.store(true, Ordering::SeqCst);
    }

    pub fn recover(&self) {
        self.stalled.store(false, Ordering::SeqCst);
        *lock(&self.persistent) = None;
        lock(&self.scripted).clear();
    }

    pub fn check_calls(&self) -> u32 {
        self.check_calls.load(Ordering::SeqCst)
    }

    pub fn reduce_calls(&self) -> u32 {
        self.reduce_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> u32 {
        self.check_calls() + self.reduce_calls()
    }

    async fn hang_if_stalled(&self) {
        if self.stalled.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
    }

    fn injected_failure(&self) -> Option<InventoryCallError> {
        if let Some(err) = lock(&self.scripted).pop_front() {
            return Some(err);
        }
        lock(&self.persistent).clone()
    }
}

#[async_trait::async_trait]
impl InventoryApi for StubInventoryApi {
    async fn is_in_stock(&self, sku: &SkuCode, quantity: i64) -> Result<bool, InventoryCallError> {
        self.check_calls.fetch_add(1, Ordering::SeqCst);
        self.hang_if_stalled().await;
        if let Some(err) = self.injected_failure() {
            return Err(err);
        }
        Ok(self.stock_of(sku.as_str()).is_some_and(|available| available >= quantity))
    }

    async fn reduce_stock(&self, sku: &SkuCode, quantity: i64) -> Result<(), InventoryCallError> {
        self.reduce_calls.fetch_add(1, Ordering::SeqCst);
        self.hang_if_stalled().await;
        if let Some(err) = self.injected_failure() {
            return Err(err);
        }
        let mut stock = lock(&self.stock);
        match stock.get_mut(sku.as_str()) {
            None => Err(InventoryCallError::Status {
                status: 404,
                body: format!("inventory record with sku {sku} not found"),
            }),
            Some(available) if *available < quantity => Err(InventoryCallError::Status {
                status: 409,
                body: format!("insufficient stock for {sku}"),
            }),
            Some(available) => {
                *available -= quantity;
                Ok(())
            }
        }
    }
}
