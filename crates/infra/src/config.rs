//! Service configuration from environment variables.
//!
//! Every loader takes a lookup function so tests can feed a map instead of
//! touching the process environment; `from_env` wires in `std::env::var`.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::inventory_client::FailurePolicy;
use crate::resilience::{BackoffStrategy, CircuitBreakerConfig, RetryPolicy};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}' ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Parse `key` if set (and non-blank), else use `default`.
fn parse_or<T, L>(lookup: &L, key: &'static str, default: T) -> ConfigResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    L: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
        _ => Ok(default),
    }
}

fn invalid(key: &'static str, value: impl ToString, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn bind_addr<L>(lookup: &L, key: &'static str, default_port: u16) -> ConfigResult<SocketAddr>
where
    L: Fn(&str) -> Option<String>,
{
    parse_or(lookup, key, SocketAddr::from(([0, 0, 0, 0], default_port)))
}

#[derive(Debug, Clone, PartialEq)]
pub struct InventoryServiceConfig {
    pub bind_addr: SocketAddr,
    /// Postgres ledger when set (and built with the `postgres` feature).
    pub database_url: Option<String>,
}

impl InventoryServiceConfig {
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<L>(lookup: L) -> ConfigResult<Self>
    where
        L: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            bind_addr: bind_addr(&lookup, "INVENTORY_BIND_ADDR", 8082)?,
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductServiceConfig {
    pub bind_addr: SocketAddr,
}

impl ProductServiceConfig {
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<L>(lookup: L) -> ConfigResult<Self>
    where
        L: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            bind_addr: bind_addr(&lookup, "PRODUCT_BIND_ADDR", 8080)?,
        })
    }
}

/// How the order service reaches (and survives) the inventory service.
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
    pub breaker: CircuitBreakerConfig,
    pub failure_policy: FailurePolicy,
}

impl Default for InventoryClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8082".to_string(),
            timeout: Duration::from_millis(2000),
            retry: RetryPolicy::default(),
            breaker: CircuitBreakerConfig::default(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl InventoryClientConfig {
    pub fn from_lookup<L>(lookup: &L) -> ConfigResult<Self>
    where
        L: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let max_attempts: u32 = parse_or(lookup, "INVENTORY_RETRY_MAX_ATTEMPTS", defaults.retry.max_attempts)?;
        if max_attempts == 0 {
            return Err(invalid("INVENTORY_RETRY_MAX_ATTEMPTS", max_attempts, "must be at least 1"));
        }
        let base_delay_ms: u64 = parse_or(
            lookup,
            "INVENTORY_RETRY_BASE_DELAY_MS",
            defaults.retry.base_delay.as_millis() as u64,
        )?;
        let strategy: BackoffStrategy = parse_or(lookup, "INVENTORY_RETRY_BACKOFF", defaults.retry.strategy)?;

        let window: usize = parse_or(lookup, "INVENTORY_CB_WINDOW", defaults.breaker.sliding_window_size)?;
        let min_calls: usize = parse_or(lookup, "INVENTORY_CB_MIN_CALLS", defaults.breaker.minimum_number_of_calls)?;
        if window == 0 {
            return Err(invalid("INVENTORY_CB_WINDOW", window, "must be at least 1"));
        }
        if min_calls > window {
            return Err(invalid("INVENTORY_CB_MIN_CALLS", min_calls, "must not exceed INVENTORY_CB_WINDOW"));
        }
        let rate: f64 = parse_or(lookup, "INVENTORY_CB_FAILURE_RATE", defaults.breaker.failure_rate_threshold)?;
        if !(rate > 0.0 && rate <= 1.0) {
            return Err(invalid("INVENTORY_CB_FAILURE_RATE", rate, "must be in (0, 1]"));
        }
        let open_ms: u64 = parse_or(
            lookup,
            "INVENTORY_CB_OPEN_MS",
            defaults.breaker.open_duration.as_millis() as u64,
        )?;
        let half_open: u32 = parse_or(
            lookup,
            "INVENTORY_CB_HALF_OPEN_CALLS",
            defaults.breaker.permitted_calls_in_half_open,
        )?;
        if half_open == 0 {
            return Err(invalid("INVENTORY_CB_HALF_OPEN_CALLS", half_open, "must be at least 1"));
        }

        let base_delay = Duration::from_millis(base_delay_ms);
        Ok(Self {
            base_url: lookup("INVENTORY_SERVICE_URL")
                .filter(|url| !url.trim().is_empty())
                .unwrap_or(defaults.base_url),
            timeout: Duration::from_millis(parse_or(
                lookup,
                "INVENTORY_HTTP_TIMEOUT_MS",
                defaults.timeout.as_millis() as u64,
            )?),
            retry: RetryPolicy {
                max_attempts,
                base_delay,
                max_delay: defaults.retry.max_delay.max(base_delay),
                strategy,
            },
            breaker: CircuitBreakerConfig {
                sliding_window_size: window,
                minimum_number_of_calls: min_calls,
                failure_rate_threshold: rate,
                open_duration: Duration::from_millis(open_ms),
                permitted_calls_in_half_open: half_open,
            },
            failure_policy: parse_or(lookup, "INVENTORY_FAILURE_POLICY", defaults.failure_policy)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderServiceConfig {
    pub bind_addr: SocketAddr,
    pub inventory: InventoryClientConfig,
}

impl OrderServiceConfig {
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<L>(lookup: L) -> ConfigResult<Self>
    where
        L: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            bind_addr: bind_addr(&lookup, "ORDER_BIND_ADDR", 8081)?,
            inventory: InventoryClientConfig::from_lookup(&lookup)?,
        })
    }
}
