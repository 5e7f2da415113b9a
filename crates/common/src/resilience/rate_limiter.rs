//! Minimum-interval rate limiter for serializing outbound requests
//!
//! Callers queue on a fair async mutex. The holder of the mutex sleeps until
//! the interval since the previous dispatch has elapsed, stamps the dispatch
//! time and releases the next caller in line, so dispatches are first-come,
//! first-served and never closer together than `min_interval`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

const MIN_INTERVAL: Duration = Duration::from_millis(1000);

/// Configuration for the rate limiter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimiterConfig {
    /// Minimum spacing between two consecutive dispatches
    pub min_interval: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self { min_interval: MIN_INTERVAL }
    }
}

impl RateLimiterConfig {
    /// Create a new configuration builder
    pub fn builder() -> RateLimiterConfigBuilder {
        RateLimiterConfigBuilder::new()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.min_interval.is_zero() {
            return Err("min_interval must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// Builder for RateLimiterConfig
#[derive(Debug, Default)]
pub struct RateLimiterConfigBuilder {
    config: RateLimiterConfig,
}

impl RateLimiterConfigBuilder {
    pub fn new() -> Self {
        Self { config: RateLimiterConfig::default() }
    }

    pub fn min_interval(mut self, interval: Duration) -> Self {
        self.config.min_interval = interval;
        self
    }

    pub fn min_interval_ms(self, millis: u64) -> Self {
        self.min_interval(Duration::from_millis(millis))
    }

    pub fn build(self) -> Result<RateLimiterConfig, String> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Process-wide FIFO rate limiter
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
///
/// use suitelink_common::resilience::RateLimiter;
///
/// # async fn example() -> Result<(), String> {
/// let limiter = RateLimiter::new(Duration::from_millis(1000))?;
/// limiter.acquire().await;
/// // issue request
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    last_dispatch: Mutex<Option<Instant>>,
    dispatched: AtomicU64,
}

impl RateLimiter {
    /// Create a limiter with the given minimum interval
    pub fn new(min_interval: Duration) -> Result<Self, String> {
        Self::from_config(RateLimiterConfig { min_interval })
    }

    /// Create a limiter from a validated configuration
    pub fn from_config(config: RateLimiterConfig) -> Result<Self, String> {
        config.validate()?;
        Ok(Self { config, last_dispatch: Mutex::new(None), dispatched: AtomicU64::new(0) })
    }

    /// Wait until the next request may be dispatched.
    ///
    /// Returns the dispatch instant recorded for this caller. Waiters are
    /// released in the order they called `acquire`.
    pub async fn acquire(&self) -> Instant {
        let mut last = self.last_dispatch.lock().await;

        if let Some(previous) = *last {
            let ready_at = previous + self.config.min_interval;
            let now = Instant::now();
            if ready_at > now {
                debug!(
                    wait_ms = u64::try_from((ready_at - now).as_millis()).unwrap_or(u64::MAX),
                    "rate limiter delaying dispatch"
                );
                sleep_until(ready_at).await;
            }
        }

        let stamp = Instant::now();
        *last = Some(stamp);
        self.dispatched.fetch_add(1, Ordering::Relaxed);
        stamp
    }

    /// Configured minimum interval
    pub const fn min_interval(&self) -> Duration {
        self.config.min_interval
    }

    /// Total number of dispatches granted so far
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self {
            config: RateLimiterConfig::default(),
            last_dispatch: Mutex::new(None),
            dispatched: AtomicU64::new(0),
        }
    }
}
