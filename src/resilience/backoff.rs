//! Exponential backoff.

use std::time::Duration;

/// Calculate the exponential backoff delay for the given retry number.
///
/// Returns `base_ms * 2^(attempt - 1)` capped at `max_ms`, and zero for
/// attempt 0. No jitter is applied, so delays never decrease as `attempt`
/// grows.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);

    Duration::from_millis(delay_ms.min(max_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_calculation() {
        assert_eq!(calculate_backoff(0, 1000, 30_000), Duration::ZERO);
        assert_eq!(calculate_backoff(1, 1000, 30_000), Duration::from_secs(1));
        assert_eq!(calculate_backoff(2, 1000, 30_000), Duration::from_secs(2));
        assert_eq!(calculate_backoff(3, 1000, 30_000), Duration::from_secs(4));
    }

    #[test]
    fn test_backoff_is_capped() {
        assert_eq!(calculate_backoff(6, 1000, 30_000), Duration::from_secs(30));
        assert_eq!(calculate_backoff(64, 1000, 30_000), Duration::from_secs(30));
        assert_eq!(calculate_backoff(u32::MAX, u64::MAX, 5), Duration::from_millis(5));
    }

    #[test]
    fn test_backoff_is_monotonic() {
        let delays: Vec<_> = (0..40).map(|a| calculate_backoff(a, 250, 30_000)).collect();
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
    }
}
