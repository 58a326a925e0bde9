//! Resilience primitives for calls to remote services: bounded retry with
//! backoff and a circuit breaker.

pub mod circuit_breaker;
pub mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState, Permit, Ticket};
pub use retry::{BackoffStrategy, RetryPolicy};
