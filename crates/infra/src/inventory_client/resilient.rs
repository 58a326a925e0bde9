use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use chrono::Utc;
use tracing::{info, warn};

use storefront_core::SkuCode;

use crate::resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitState, Permit, RetryPolicy, Ticket};

use super::{
    FailureKind, FailurePolicy, FailureRecord, InventoryApi, InventoryCallError, InventoryOperation, ReduceOutcome,
    StockCheck, StockGateway,
};

pub const FAILURE_JOURNAL_CAPACITY: usize = 64;

/// Inventory client with bounded retry, a circuit breaker and fallbacks.
///
/// One logical call = up to `retry.max_attempts` attempts = one breaker
/// sample. Neither operation ever returns an error: an unanswered check
/// resolves through the `FailurePolicy`, an undone reduction is absorbed.
/// Every fallback is logged and journaled.
#[derive(Debug)]
pub struct ResilientInventoryClient<A> {
    api: A,
    retry: RetryPolicy,
    policy: FailurePolicy,
    breaker: Mutex<CircuitBreaker>,
    journal: Mutex<VecDeque<FailureRecord>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<A: InventoryApi> ResilientInventoryClient<A> {
    pub fn new(api: A) -> Self {
        Self::with_settings(
            api,
            RetryPolicy::default(),
            CircuitBreakerConfig::default(),
            FailurePolicy::default(),
        )
    }

    pub fn with_settings(api: A, retry: RetryPolicy, breaker: CircuitBreakerConfig, policy: FailurePolicy) -> Self {
        Self {
            api,
            retry,
            policy,
            breaker: Mutex::new(CircuitBreaker::new(breaker)),
            journal: Mutex::new(VecDeque::with_capacity(FAILURE_JOURNAL_CAPACITY)),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn circuit_state(&self) -> CircuitState {
        lock(&self.breaker).state(Instant::now())
    }

    /// Fallback journal, oldest first.
    pub fn recent_failures(&self) -> Vec<FailureRecord> {
        lock(&self.journal).iter().cloned().collect()
    }

    async fn guarded<T, F, Fut>(
        &self,
        operation: InventoryOperation,
        sku: &SkuCode,
        quantity: i64,
        call: F,
    ) -> Result<T, FailureRecord>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, InventoryCallError>>,
    {
        let permit = lock(&self.breaker).try_acquire(Instant::now());
        let Permit::Granted(ticket) = permit else {
            return Err(self.journal_failure(
                operation,
                sku,
                quantity,
                FailureKind::CircuitOpen,
                "circuit breaker is open".to_string(),
            ));
        };
        let trial = Trial {
            breaker: &self.breaker,
            ticket: Some(ticket),
        };

        match self.retry.run(call, InventoryCallError::is_transient).await {
            Ok(value) => {
                trial.finish(CircuitBreaker::on_success);
                Ok(value)
            }
            Err(err) if err.is_transient() => {
                trial.finish(CircuitBreaker::on_failure);
                Err(self.journal_failure(operation, sku, quantity, FailureKind::RetriesExhausted, err.to_string()))
            }
            Err(err) => {
                // The service answered, so it is healthy as far as the breaker is concerned.
                trial.finish(CircuitBreaker::on_success);
                Err(self.journal_failure(operation, sku, quantity, FailureKind::Rejected, err.to_string()))
            }
        }
    }

    fn journal_failure(
        &self,
        operation: InventoryOperation,
        sku: &SkuCode,
        quantity: i64,
        kind: FailureKind,
        reason: String,
    ) -> FailureRecord {
        warn!(%operation, sku = %sku, quantity, ?kind, %reason, "inventory call fell back");
        let record = FailureRecord {
            at: Utc::now(),
            operation,
            sku_code: sku.as_str().to_string(),
            quantity,
            kind,
            reason,
        };
        let mut journal = lock(&self.journal);
        if journal.len() == FAILURE_JOURNAL_CAPACITY {
            journal.pop_front();
        }
        journal.push_back(record.clone());
        record
    }
}

/// A granted breaker permit for one logical call. Dropped without `finish`
/// (the caller's future was cancelled mid-call) it abandons the call.
struct Trial<'a> {
    breaker: &'a Mutex<CircuitBreaker>,
    ticket: Option<Ticket>,
}

impl Trial<'_> {
    fn finish(mut self, outcome: fn(&mut CircuitBreaker, Ticket, Instant) -> CircuitState) {
        self.record(outcome);
    }

    fn record(&mut self, outcome: fn(&mut CircuitBreaker, Ticket, Instant) -> CircuitState) {
        let Some(ticket) = self.ticket.take() else {
            return;
        };
        let now = Instant::now();
        let mut breaker = lock(self.breaker);
        let before = breaker.state(now);
        let after = outcome(&mut breaker, ticket, now);
        drop(breaker);

        match (before, after) {
            (CircuitState::Open, _) | (_, CircuitState::HalfOpen) => {}
            (_, CircuitState::Open) => warn!(from = ?before, "inventory circuit breaker opened"),
            (CircuitState::HalfOpen, CircuitState::Closed) => info!("inventory circuit breaker closed"),
            _ => {}
        }
    }
}

impl Drop for Trial<'_> {
    fn drop(&mut self) {
        if self.ticket.is_some() {
            warn!("inventory call dropped before it finished");
            self.record(CircuitBreaker::abandon);
        }
    }
}

#[async_trait::async_trait]
impl<A: InventoryApi> StockGateway for ResilientInventoryClient<A> {
    async fn check_stock(&self, sku: &SkuCode, quantity: i64) -> StockCheck {
        let outcome = self
            .guarded(InventoryOperation::CheckStock, sku, quantity, || self.api.is_in_stock(sku, quantity))
            .await;
        match outcome {
            Ok(available) => StockCheck::Answered(available),
            Err(failure) => StockCheck::Fallback {
                available: self.policy.fallback_availability(),
                reason: failure.reason,
            },
        }
    }

    async fn reduce_stock(&self, sku: &SkuCode, quantity: i64) -> ReduceOutcome {
        let outcome = self
            .guarded(InventoryOperation::ReduceStock, sku, quantity, || self.api.reduce_stock(sku, quantity))
            .await;
        match outcome {
            Ok(()) => ReduceOutcome::Reduced,
            Err(failure) => {
                warn!(sku = %sku, quantity, "stock reduction absorbed, inventory may drift");
                ReduceOutcome::Absorbed { reason: failure.reason }
            }
        }
    }
}
