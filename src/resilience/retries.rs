//! Retry policy.
//!
//! # Responsibilities
//! - Bound the number of store attempts per logical upload
//! - Compute the delay before each attempt
//!
//! # Design Decisions
//! - Only transport failures are retried; the caller decides what is transient
//! - The delay before attempt `i` is `base * 2^(i-2)`, capped

use std::time::Duration;

use crate::config::UploadConfig;
use crate::resilience::backoff::calculate_backoff;

/// Upper bound accepted for `max_retries`.
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// How many times a store is attempted and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay_ms: u64,
    max_delay_ms: u64,
}

impl RetryPolicy {
    /// Build a policy, clamping `max_retries` into `1..=10`.
    pub fn new(max_retries: u32, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_retries: max_retries.clamp(1, MAX_RETRIES_LIMIT),
            base_delay_ms,
            max_delay_ms,
        }
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(config.max_retries, config.base_delay_ms, config.max_delay_ms)
    }

    /// Total number of store attempts allowed.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay to wait before the given 1-based attempt.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        calculate_backoff(attempt.saturating_sub(1), self.base_delay_ms, self.max_delay_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&UploadConfig::default())
    }
}
