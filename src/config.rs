//! Timing knobs for polling, confirmation, and enrichment
use std::time::Duration;

/// Per-session configuration. Defaults match the production desktop client;
/// tests shrink the durations to keep paused-clock runs fast.
#[derive(Clone, Debug)]
pub struct Config {
    /// A schedule older than this is flagged expired and blocked from
    /// execution.
    pub schedule_max_age: Duration,
    /// Upper bound on the post-submission mirror confirmation wait.
    pub confirmation_timeout: Duration,
    /// Cadence of confirmation lookups within the timeout window.
    pub confirmation_poll_interval: Duration,
    /// Grace period before the first enrichment lookup, covering the mirror
    /// node's indexing delay.
    pub enrichment_initial_delay: Duration,
    /// Bounded number of enrichment lookups before giving up (best-effort).
    pub enrichment_attempts: u32,
    pub enrichment_retry_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schedule_max_age: Duration::from_secs(30 * 60),
            confirmation_timeout: Duration::from_secs(60),
            confirmation_poll_interval: Duration::from_secs(2),
            enrichment_initial_delay: Duration::from_secs(2),
            enrichment_attempts: 12,
            enrichment_retry_interval: Duration::from_millis(500),
        }
    }
}
