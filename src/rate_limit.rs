//! In-memory rate limiting for sign-in code requests.
//!
//! DESIGN
//! ======
//! Sliding-window counters backed by `HashMap<String, VecDeque<Instant>>`.
//! Two limits share one window:
//! - Per-address: codes requested for a single email
//! - Global: codes requested across all addresses
//!
//! State lives in process memory, so limits reset on restart and are not
//! shared between replicas.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const DEFAULT_PER_ADDRESS_LIMIT: usize = 5;
const DEFAULT_GLOBAL_LIMIT: usize = 200;
const DEFAULT_WINDOW_SECS: u64 = 600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub per_address_limit: usize,
    pub global_limit: usize,
    pub window: Duration,
}

impl RateLimitConfig {
    /// Load from `RATE_LIMIT_EMAIL_PER_ADDRESS`, `RATE_LIMIT_EMAIL_GLOBAL`,
    /// and `RATE_LIMIT_EMAIL_WINDOW_SECS`, falling back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            per_address_limit: env_parse("RATE_LIMIT_EMAIL_PER_ADDRESS", DEFAULT_PER_ADDRESS_LIMIT),
            global_limit: env_parse("RATE_LIMIT_EMAIL_GLOBAL", DEFAULT_GLOBAL_LIMIT),
            window: Duration::from_secs(env_parse("RATE_LIMIT_EMAIL_WINDOW_SECS", DEFAULT_WINDOW_SECS)),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_address_limit: DEFAULT_PER_ADDRESS_LIMIT,
            global_limit: DEFAULT_GLOBAL_LIMIT,
            window: Duration::from_secs(DEFAULT_WINDOW_SECS),
        }
    }
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

// =============================================================================
// ERROR TYPE
// =============================================================================

#[derive(Debug, thiserror::Error)]
#[allow(clippy::enum_variant_names)]
pub enum RateLimitError {
    #[error("too many code requests for this address (max {limit}/{window_secs}s)")]
    PerAddressExceeded { limit: usize, window_secs: u64 },
    #[error("too many code requests (max {limit}/{window_secs}s)")]
    GlobalExceeded { limit: usize, window_secs: u64 },
}

// =============================================================================
// RATE LIMITER
// =============================================================================

#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Mutex<RateLimiterInner>>,
    config: RateLimitConfig,
}

#[derive(Default)]
struct RateLimiterInner {
    /// Request timestamps per normalized address.
    per_address: HashMap<String, VecDeque<Instant>>,
    global: VecDeque<Instant>,
}

impl RateLimiter {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RateLimitConfig::from_env())
    }

    #[must_use]
    pub fn with_config(config: RateLimitConfig) -> Self {
        Self { inner: Arc::new(Mutex::new(RateLimiterInner::default())), config }
    }

    /// Check both limits for `key`, then record the request.
    ///
    /// # Errors
    ///
    /// Returns which limit was exceeded. Rejected requests are not recorded.
    pub fn check_and_record(&self, key: &str) -> Result<(), RateLimitError> {
        self.check_and_record_at(key, Instant::now())
    }

    fn check_and_record_at(&self, key: &str, now: Instant) -> Result<(), RateLimitError> {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let cfg = self.config;
        let window_secs = cfg.window.as_secs();

        prune_window(&mut inner.global, now, cfg.window);
        if inner.global.len() >= cfg.global_limit {
            return Err(RateLimitError::GlobalExceeded { limit: cfg.global_limit, window_secs });
        }

        let address = inner.per_address.entry(key.to_owned()).or_default();
        prune_window(address, now, cfg.window);
        if address.len() >= cfg.per_address_limit {
            return Err(RateLimitError::PerAddressExceeded { limit: cfg.per_address_limit, window_secs });
        }

        address.push_back(now);
        inner.global.push_back(now);
        inner
            .per_address
            .retain(|_, stamps| stamps.back().is_some_and(|&t| now.duration_since(t) <= cfg.window));
        Ok(())
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

fn prune_window(deque: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&front) = deque.front() {
        if now.duration_since(front) > window {
            deque.pop_front();
        } else {
            break;
        }
    }
}

#[cfg(test)]
#[path = "rate_limit_test.rs"]
mod tests;
