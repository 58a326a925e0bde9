//! Count-based circuit breaker.
//!
//! ```text
//!            failure rate >= threshold
//!   CLOSED ----------------------------> OPEN
//!     ^                                   |  open_duration elapsed
//!     | permitted trials succeeded        v
//!     +------------------------------ HALF_OPEN
//!                                         |  any trial fails or is dropped
//!                                         +--------------------> OPEN
//! ```
//!
//! The machine never reads the clock itself: every transition takes the
//! caller's `Instant`.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    pub sliding_window_size: usize,
    pub minimum_number_of_calls: usize,
    /// Fraction of failed calls in the window (0.0-1.0) that opens the circuit
    pub failure_rate_threshold: f64,
    pub open_duration: Duration,
    pub permitted_calls_in_half_open: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            sliding_window_size: 10,
            minimum_number_of_calls: 5,
            failure_rate_threshold: 0.5,
            open_duration: Duration::from_secs(5),
            permitted_calls_in_half_open: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Proof that a call was let through. Hand it back exactly once through
/// `on_success`, `on_failure` or `abandon`.
#[derive(Debug, PartialEq, Eq)]
#[must_use]
pub struct Ticket {
    generation: u64,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Permit {
    Granted(Ticket),
    /// Circuit is open (or half-open with every trial slot taken).
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Closed,
    Open { since: Instant },
    HalfOpen { in_flight: u32, succeeded: u32 },
}

#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    phase: Phase,
    /// Bumped on every phase change; outcomes of tickets from an earlier
    /// generation are ignored.
    generation: u64,
    /// `true` = failure; newest at the back.
    window: VecDeque<bool>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        let capacity = config.sliding_window_size.max(1);
        Self {
            config,
            phase: Phase::Closed,
            generation: 0,
            window: VecDeque::with_capacity(capacity),
        }
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Current state as seen at `now` (an expired OPEN reads as HALF_OPEN).
    pub fn state(&self, now: Instant) -> CircuitState {
        match self.phase {
            Phase::Closed => CircuitState::Closed,
            Phase::Open { since } if self.cool_down_elapsed(since, now) => CircuitState::HalfOpen,
            Phase::Open { .. } => CircuitState::Open,
            Phase::HalfOpen { .. } => CircuitState::HalfOpen,
        }
    }

    /// Ask to make one call.
    pub fn try_acquire(&mut self, now: Instant) -> Permit {
        if let Phase::Open { since } = self.phase {
            if !self.cool_down_elapsed(since, now) {
                return Permit::Rejected;
            }
            self.enter(Phase::HalfOpen {
                in_flight: 0,
                succeeded: 0,
            });
        }

        let limit = self.config.permitted_calls_in_half_open.max(1);
        match &mut self.phase {
            Phase::Closed => {}
            Phase::HalfOpen { in_flight, succeeded } if *in_flight + *succeeded < limit => *in_flight += 1,
            Phase::HalfOpen { .. } | Phase::Open { .. } => return Permit::Rejected,
        }
        Permit::Granted(Ticket {
            generation: self.generation,
        })
    }

    /// Returns the state after recording the outcome.
    pub fn on_success(&mut self, ticket: Ticket, now: Instant) -> CircuitState {
        if !self.is_current(&ticket) {
            return self.state(now);
        }
        match self.phase {
            Phase::Closed => self.record(false, now),
            Phase::HalfOpen { in_flight, succeeded } => {
                let succeeded = succeeded + 1;
                if succeeded >= self.config.permitted_calls_in_half_open.max(1) {
                    self.enter(Phase::Closed);
                    self.window.clear();
                } else {
                    self.phase = Phase::HalfOpen {
                        in_flight: in_flight.saturating_sub(1),
                        succeeded,
                    };
                }
            }
            Phase::Open { .. } => {}
        }
        self.state(now)
    }

    /// Returns the state after recording the outcome.
    pub fn on_failure(&mut self, ticket: Ticket, now: Instant) -> CircuitState {
        if !self.is_current(&ticket) {
            return self.state(now);
        }
        match self.phase {
            Phase::Closed => self.record(true, now),
            Phase::HalfOpen { .. } => self.trip(now),
            Phase::Open { .. } => {}
        }
        self.state(now)
    }

    /// The call behind `ticket` ended without an outcome (its future was
    /// dropped). No sample while CLOSED; an unfinished trial reopens the
    /// circuit.
    pub fn abandon(&mut self, ticket: Ticket, now: Instant) -> CircuitState {
        if self.is_current(&ticket) && matches!(self.phase, Phase::HalfOpen { .. }) {
            self.trip(now);
        }
        self.state(now)
    }

    /// Failure rate over the current window, `None` below the minimum call count.
    pub fn failure_rate(&self) -> Option<f64> {
        let recorded = self.window.len();
        if recorded == 0 || recorded < self.config.minimum_number_of_calls {
            return None;
        }
        let failures = self.window.iter().filter(|failed| **failed).count();
        Some(failures as f64 / recorded as f64)
    }

    fn record(&mut self, failed: bool, now: Instant) {
        if self.window.len() == self.config.sliding_window_size.max(1) {
            self.window.pop_front();
        }
        self.window.push_back(failed);

        if let Some(rate) = self.failure_rate() {
            if rate >= self.config.failure_rate_threshold {
                self.trip(now);
            }
        }
    }

    fn trip(&mut self, now: Instant) {
        self.enter(Phase::Open { since: now });
        self.window.clear();
    }

    fn enter(&mut self, phase: Phase) {
        self.phase = phase;
        self.generation += 1;
    }

    fn is_current(&self, ticket: &Ticket) -> bool {
        ticket.generation == self.generation
    }

    fn cool_down_elapsed(&self, since: Instant, now: Instant) -> bool {
        now.saturating_duration_since(since) >= self.config.open_duration
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}
