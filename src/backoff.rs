//! Shared backoff arithmetic.
//!
//! Both the connect retry (C1) and the error-110 busy backoff (C4) use the
//! same "double the base delay, cap it" shape; the teacher's own networking
//! code doesn't back off at all, so this is grounded instead on
//! `7D-Solutions-7D-Solutions-Platform/platform/event-bus/src/consumer_retry.rs`'s
//! `retry_with_backoff`, which computes `min(backoff * 2, max_backoff)` per
//! attempt. Kept integer-only (no floating point) per the workspace's
//! `float_arithmetic` lint.

use std::time::Duration;

/// `min(base * 2^(attempt - 1), cap)`, saturating rather than overflowing
/// for implausibly large `attempt` values.
#[must_use]
pub fn exponential(attempt: u32, base: Duration, cap: Duration) -> Duration {
    let shift = attempt.saturating_sub(1);
    let factor = 1u32.checked_shl(shift).unwrap_or(u32::MAX);
    base.checked_mul(factor).unwrap_or(cap).min(cap)
}

/// `base * attempt`, used for the linear send-retry and `getStatus` retry
/// backoffs (spec.md §4.1, §4.3).
#[must_use]
pub fn linear(attempt: u32, base: Duration) -> Duration {
    base.checked_mul(attempt).unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_matches_spec_sequence() {
        let base = Duration::from_millis(1000);
        let cap = Duration::from_millis(30_000);
        let got: Vec<_> = (1..=7).map(|k| exponential(k, base, cap).as_millis()).collect();
        assert_eq!(got, vec![1000, 2000, 4000, 8000, 16_000, 30_000, 30_000]);
    }

    #[test]
    fn linear_matches_spec_sequence() {
        let base = Duration::from_millis(1000);
        let got: Vec<_> = (1..=3).map(|k| linear(k, base).as_millis()).collect();
        assert_eq!(got, vec![1000, 2000, 3000]);
    }
}
