//! Property tests for the schedule poller's backoff policy.
use proptest::prelude::*;
use std::time::Duration;
use transaction_approval::poller::backoff_interval;

proptest! {
    /// The interval never shrinks as the unchanged-poll count grows.
    #[test]
    fn backoff_is_monotone_in_poll_count(a in 0u32..10_000, b in 0u32..10_000) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(backoff_interval(low) <= backoff_interval(high));
    }

    /// Every count lands in one of the four tiers and within their bounds.
    #[test]
    fn backoff_stays_within_tier_bounds(count in 0u32..u32::MAX) {
        let interval = backoff_interval(count);
        prop_assert!(interval >= Duration::from_secs(2));
        prop_assert!(interval <= Duration::from_secs(30));
        prop_assert!([2u64, 5, 10, 30].contains(&interval.as_secs()));
    }
}
