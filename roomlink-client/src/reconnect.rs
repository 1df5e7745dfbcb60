//! Reconnection strategies
//!
//! When a connection closes without an explicit `disconnect()`, the client
//! runs a single retry loop. Before each tick the loop asks its strategy
//! how long to wait; `None` ends the loop and the client stays closed until
//! the caller connects again.
//!
//! # Built-in Strategies
//!
//! - **FixedInterval**: Constant delay, bounded attempt count (the default:
//!   one second, 1000 attempts)
//! - **ExponentialBackoff**: Doubling delay with an upper bound and optional jitter
//! - **NoReconnect**: Never retry
//!
//! ```rust
//! use roomlink_client::{FixedInterval, ReconnectionStrategy};
//! use std::time::Duration;
//!
//! let mut strategy = FixedInterval::new(Duration::from_millis(250)).with_max_attempts(20);
//! assert_eq!(strategy.next_delay(0), Some(Duration::from_millis(250)));
//! assert_eq!(strategy.next_delay(20), None);
//! ```

use std::time::Duration;

/// Delay used by [`FixedInterval::default`]
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_secs(1);

/// Attempt ceiling used by [`FixedInterval::default`]
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1000;

/// Trait for reconnection strategies
///
/// `attempt` is the number of reconnection attempts already issued since
/// the connection was last open. `reset()` is called whenever a connection
/// opens successfully.
pub trait ReconnectionStrategy: Send + Sync {
    /// Returns the delay before the next retry tick, or `None` to give up
    fn next_delay(&mut self, attempt: u32) -> Option<Duration>;

    /// Reset any accumulated state after a successful open
    fn reset(&mut self);
}

/// Retry at a constant interval, up to a ceiling
#[derive(Debug, Clone)]
pub struct FixedInterval {
    interval: Duration,
    max_attempts: Option<u32>,
}

impl FixedInterval {
    /// Retry every `interval` with no ceiling
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
        }
    }

    /// Give up once `max_attempts` attempts have been issued
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// The configured interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// The configured ceiling, if any
    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }
}

impl Default for FixedInterval {
    fn default() -> Self {
        Self::new(DEFAULT_RECONNECT_INTERVAL).with_max_attempts(DEFAULT_MAX_ATTEMPTS)
    }
}

impl ReconnectionStrategy for FixedInterval {
    fn next_delay(&mut self, attempt: u32) -> Option<Duration> {
        match self.max_attempts {
            Some(max) if attempt >= max => None,
            _ => Some(self.interval),
        }
    }

    fn reset(&mut self) {}
}

/// Exponential backoff with optional jitter
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    min_delay: Duration,
    max_delay: Duration,
    max_attempts: Option<u32>,
    jitter: bool,
    current_attempt: u32,
}

impl ExponentialBackoff {
    /// Start at `min_delay`, double per attempt, never exceed `max_delay`
    pub fn new(min_delay: Duration, max_delay: Duration) -> Self {
        Self {
            min_delay,
            max_delay,
            max_attempts: None,
            jitter: false,
            current_attempt: 0,
        }
    }

    /// Give up once `max_attempts` attempts have been issued
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Add a random 0-25% on top of every delay
    pub fn with_jitter(mut self) -> Self {
        self.jitter = true;
        self
    }
}

impl ReconnectionStrategy for ExponentialBackoff {
    fn next_delay(&mut self, attempt: u32) -> Option<Duration> {
        self.current_attempt = attempt;

        if let Some(max) = self.max_attempts {
            if attempt >= max {
                return None;
            }
        }

        // Saturate instead of overflowing once the shift gets large
        let factor = 2u64.checked_pow(attempt).unwrap_or(u64::MAX);
        let base = (self.min_delay.as_millis() as u64).saturating_mul(factor);
        let delay = base.min(self.max_delay.as_millis() as u64);

        if self.jitter {
            use rand::Rng;
            let jitter_ms = rand::thread_rng().gen_range(0..=(delay / 4));
            return Some(Duration::from_millis(delay + jitter_ms));
        }

        Some(Duration::from_millis(delay))
    }

    fn reset(&mut self) {
        self.current_attempt = 0;
    }
}

/// Never reconnect
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReconnect;

impl ReconnectionStrategy for NoReconnect {
    fn next_delay(&mut self, _attempt: u32) -> Option<Duration> {
        None
    }

    fn reset(&mut self) {}
}
