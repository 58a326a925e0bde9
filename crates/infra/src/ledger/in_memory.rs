use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use tracing::info;

use storefront_core::{DomainError, RecordId, SkuCode};
use storefront_inventory::{StockRecord, ensure_requested_quantity, ensure_stock_quantity};

use super::{LedgerError, LedgerResult, StockLedger, id_not_found, sku_not_found};

#[derive(Debug, Default)]
struct LedgerState {
    records: BTreeMap<RecordId, StockRecord>,
    by_sku: HashMap<SkuCode, RecordId>,
    last_id: u64,
}

impl LedgerState {
    fn record_for_sku_mut(&mut self, sku: &SkuCode) -> Option<&mut StockRecord> {
        let id = self.by_sku.get(sku)?;
        self.records.get_mut(id)
    }
}

/// In-memory stock ledger for tests/dev.
///
/// One `RwLock` guards records and the SKU index together. Mutations hold
/// the write lock across check and mutate, which is what makes
/// `reduce_stock` atomic per SKU.
#[derive(Debug, Default)]
pub struct InMemoryStockLedger {
    state: RwLock<LedgerState>,
}

impl InMemoryStockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> LedgerResult<RwLockReadGuard<'_, LedgerState>> {
        self.state
            .read()
            .map_err(|_| LedgerError::Storage("stock ledger lock poisoned".to_string()))
    }

    fn write(&self) -> LedgerResult<RwLockWriteGuard<'_, LedgerState>> {
        self.state
            .write()
            .map_err(|_| LedgerError::Storage("stock ledger lock poisoned".to_string()))
    }
}

#[async_trait::async_trait]
impl StockLedger for InMemoryStockLedger {
    async fn add_stock(&self, sku: &SkuCode, quantity: i64) -> LedgerResult<StockRecord> {
        ensure_stock_quantity(quantity)?;
        let now = Utc::now();
        let mut state = self.write()?;

        if let Some(record) = state.record_for_sku_mut(sku) {
            record.restock(quantity, now)?;
            info!(sku = %sku, quantity, "inventory restocked");
            return Ok(record.clone());
        }

        state.last_id += 1;
        let id = RecordId::new(state.last_id);
        let record = StockRecord::new(id, sku.clone(), quantity, now)?;
        state.by_sku.insert(sku.clone(), id);
        state.records.insert(id, record.clone());
        info!(sku = %sku, quantity, id = %id, "inventory added");
        Ok(record)
    }

    async fn reduce_stock(&self, sku: &SkuCode, quantity: i64) -> LedgerResult<StockRecord> {
        ensure_requested_quantity(quantity)?;
        let mut state = self.write()?;
        let record = state
            .record_for_sku_mut(sku)
            .ok_or_else(|| sku_not_found(sku))?;
        record.reduce(quantity, Utc::now())?;
        info!(sku = %sku, reduced_by = quantity, remaining = record.quantity(), "stock reduced");
        Ok(record.clone())
    }

    async fn is_in_stock(&self, sku: &SkuCode, quantity: i64) -> LedgerResult<bool> {
        ensure_requested_quantity(quantity)?;
        let state = self.read()?;
        Ok(state
            .by_sku
            .get(sku)
            .and_then(|id| state.records.get(id))
            .is_some_and(|r| r.can_fulfil(quantity)))
    }

    async fn find_by_sku(&self, sku: &SkuCode) -> LedgerResult<Option<StockRecord>> {
        let state = self.read()?;
        Ok(state.by_sku.get(sku).and_then(|id| state.records.get(id)).cloned())
    }

    async fn list_stock(&self) -> LedgerResult<Vec<StockRecord>> {
        let state = self.read()?;
        Ok(state.records.values().cloned().collect())
    }

    async fn update_stock(&self, id: RecordId, sku: &SkuCode, quantity: i64) -> LedgerResult<StockRecord> {
        ensure_stock_quantity(quantity)?;
        let mut state = self.write()?;

        if let Some(owner) = state.by_sku.get(sku) {
            if *owner != id {
                return Err(DomainError::conflict(format!(
                    "sku {sku} already belongs to inventory record {owner}"
                ))
                .into());
            }
        }

        let record = state.records.get_mut(&id).ok_or_else(|| id_not_found(id))?;
        let old_sku = record.sku_code().clone();
        record.reassign(sku.clone(), quantity, Utc::now())?;
        let updated = record.clone();

        state.by_sku.remove(&old_sku);
        state.by_sku.insert(sku.clone(), id);
        info!(id = %id, sku = %sku, quantity, "inventory updated");
        Ok(updated)
    }

    async fn delete_stock(&self, id: RecordId) -> LedgerResult<StockRecord> {
        let mut state = self.write()?;
        let record = state.records.remove(&id).ok_or_else(|| id_not_found(id))?;
        state.by_sku.remove(record.sku_code());
        info!(id = %id, sku = %record.sku_code(), "inventory deleted");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn sku(s: &str) -> SkuCode {
        SkuCode::parse(s).unwrap()
    }

    #[tokio::test]
    async fn availability_after_add() {
        let ledger = InMemoryStockLedger::new();
        ledger.add_stock(&sku("sku1"), 100).await.unwrap();

        assert!(ledger.is_in_stock(&sku("sku1"), 100).await.unwrap());
        assert!(!ledger.is_in_stock(&sku("sku1"), 101).await.unwrap());
        // Unknown SKU is "not in stock", not an error.
        assert!(!ledger.is_in_stock(&sku("nope"), 1).await.unwrap());
    }

    #[tokio::test]
    async fn reduce_then_overdraw_leaves_quantity_unchanged() {
        let ledger = InMemoryStockLedger::new();
        ledger.add_stock(&sku("sku1"), 100).await.unwrap();

        let rec = ledger.reduce_stock(&sku("sku1"), 30).await.unwrap();
        assert_eq!(rec.quantity(), 70);

        let err = ledger.reduce_stock(&sku("sku1"), 1000).await.unwrap_err();
        assert_eq!(
            err,
            LedgerError::Domain(DomainError::insufficient_stock("sku1", 1000, 70))
        );
        let rec = ledger.find_by_sku(&sku("sku1")).await.unwrap().unwrap();
        assert_eq!(rec.quantity(), 70);
    }

    #[tokio::test]
    async fn reduce_unknown_sku_is_not_found() {
        let ledger = InMemoryStockLedger::new();
        let err = ledger.reduce_stock(&sku("ghost"), 1).await.unwrap_err();
        assert!(matches!(err.domain(), Some(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn negative_quantities_are_validation_errors() {
        let ledger = InMemoryStockLedger::new();
        let err = ledger.add_stock(&sku("sku1"), -1).await.unwrap_err();
        assert!(matches!(err.domain(), Some(DomainError::Validation(_))));
        assert!(ledger.list_stock().await.unwrap().is_empty());

        ledger.add_stock(&sku("sku1"), 5).await.unwrap();
        let err = ledger.reduce_stock(&sku("sku1"), -3).await.unwrap_err();
        assert!(matches!(err.domain(), Some(DomainError::Validation(_))));
        let err = ledger.is_in_stock(&sku("sku1"), -3).await.unwrap_err();
        assert!(matches!(err.domain(), Some(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn add_overwrites_existing_sku_and_keeps_id() {
        let ledger = InMemoryStockLedger::new();
        let first = ledger.add_stock(&sku("sku1"), 10).await.unwrap();
        let second = ledger.add_stock(&sku("sku1"), 25).await.unwrap();

        assert_eq!(first.id_typed(), second.id_typed());
        assert_eq!(second.quantity(), 25);
        assert_eq!(ledger.list_stock().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_cannot_steal_another_records_sku() {
        let ledger = InMemoryStockLedger::new();
        let a = ledger.add_stock(&sku("a"), 1).await.unwrap();
        ledger.add_stock(&sku("b"), 2).await.unwrap();

        let err = ledger.update_stock(a.id_typed(), &sku("b"), 9).await.unwrap_err();
        assert!(matches!(err.domain(), Some(DomainError::Conflict(_))));

        let renamed = ledger.update_stock(a.id_typed(), &sku("c"), 9).await.unwrap();
        assert_eq!(renamed.sku_code().as_str(), "c");
        assert!(ledger.find_by_sku(&sku("a")).await.unwrap().is_none());
        assert!(ledger.is_in_stock(&sku("c"), 9).await.unwrap());
    }

    #[tokio::test]
    async fn delete_removes_record_and_sku_index() {
        let ledger = InMemoryStockLedger::new();
        let rec = ledger.add_stock(&sku("sku1"), 3).await.unwrap();

        ledger.delete_stock(rec.id_typed()).await.unwrap();
        assert!(!ledger.is_in_stock(&sku("sku1"), 0).await.unwrap());

        let err = ledger.delete_stock(rec.id_typed()).await.unwrap_err();
        assert!(matches!(err.domain(), Some(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn record_ids_are_never_reused() {
        let ledger = InMemoryStockLedger::new();
        let a = ledger.add_stock(&sku("a"), 1).await.unwrap();
        ledger.delete_stock(a.id_typed()).await.unwrap();
        let b = ledger.add_stock(&sku("b"), 1).await.unwrap();
        assert!(b.id_typed() > a.id_typed());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_overdraw_has_exactly_one_winner() {
        for _ in 0..50 {
            let ledger = Arc::new(InMemoryStockLedger::new());
            ledger.add_stock(&sku("sku1"), 100).await.unwrap();

            let l1 = ledger.clone();
            let l2 = ledger.clone();
            let t1 = tokio::spawn(async move { l1.reduce_stock(&sku("sku1"), 60).await });
            let t2 = tokio::spawn(async move { l2.reduce_stock(&sku("sku1"), 60).await });
            let results = [t1.await.unwrap(), t2.await.unwrap()];

            let ok = results.iter().filter(|r| r.is_ok()).count();
            let insufficient = results
                .iter()
                .filter(|r| matches!(r, Err(LedgerError::Domain(DomainError::InsufficientStock { .. }))))
                .count();
            assert_eq!((ok, insufficient), (1, 1));

            let rec = ledger.find_by_sku(&sku("sku1")).await.unwrap().unwrap();
            assert_eq!(rec.quantity(), 40);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn many_concurrent_reducers_never_go_negative() {
        let ledger = Arc::new(InMemoryStockLedger::new());
        ledger.add_stock(&sku("hot"), 500).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..200 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                ledger.reduce_stock(&sku("hot"), 1 + (i % 7)).await
            }));
        }

        let mut taken = 0;
        for h in handles {
            if let Ok(rec) = h.await.unwrap() {
                assert!(rec.quantity() >= 0);
                taken += 1;
            }
        }

        let rec = ledger.find_by_sku(&sku("hot")).await.unwrap().unwrap();
        assert!(rec.quantity() >= 0);
        assert!(taken > 0);
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Add(u8, i64),
            Reduce(u8, i64),
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (0u8..3, -5i64..100).prop_map(|(s, q)| Op::Add(s, q)),
                (0u8..3, -5i64..100).prop_map(|(s, q)| Op::Reduce(s, q)),
            ]
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 200,
                ..ProptestConfig::default()
            })]

            /// Property: after any add/reduce sequence every stored quantity is >= 0.
            #[test]
            fn stored_quantity_never_negative(ops in proptest::collection::vec(op(), 0..60)) {
                let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
                rt.block_on(async {
                    let ledger = InMemoryStockLedger::new();
                    for op in ops {
                        let _ = match op {
                            Op::Add(s, q) => ledger.add_stock(&sku(&format!("s{s}")), q).await,
                            Op::Reduce(s, q) => ledger.reduce_stock(&sku(&format!("s{s}")), q).await,
                        };
                    }
                    for rec in ledger.list_stock().await.unwrap() {
                        assert!(rec.quantity() >= 0);
                    }
                });
            }

            /// Property: repeated availability checks without mutation agree.
            #[test]
            fn is_in_stock_is_idempotent(stock in 0i64..500, asked in 0i64..1_000) {
                let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
                let (a, b) = rt.block_on(async {
                    let ledger = InMemoryStockLedger::new();
                    ledger.add_stock(&sku("sku1"), stock).await.unwrap();
                    let a = ledger.is_in_stock(&sku("sku1"), asked).await.unwrap();
                    let b = ledger.is_in_stock(&sku("sku1"), asked).await.unwrap();
                    (a, b)
                });
                prop_assert_eq!(a, b);
                prop_assert_eq!(a, stock >= asked);
            }
        }
    }
}
