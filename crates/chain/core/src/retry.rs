//! Bounded retry policies for the write and read paths.
//!
//! Both policies terminate after a fixed attempt count; nothing in this
//! crate retries indefinitely. Tests inject zero-delay variants.

use std::time::Duration;

/// Finality-polling attempts before giving up on a transaction.
pub const TX_MAX_RETRIES: u32 = 9;

/// Fixed interval between finality polls.
pub const TX_RETRY_INTERVAL: Duration = Duration::from_millis(350);

/// Pause after a transient transport failure before polling again.
pub const TX_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Indexer query attempts before reporting the record as unknown.
pub const QUERY_MAX_RETRIES: u32 = 5;

/// Base delay unit for indexer queries; attempt `i` waits `base * (i + 1)`.
pub const QUERY_BASE_DELAY: Duration = Duration::from_millis(300);

/// Policy for transaction finality polling: fixed-interval, bounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalityPolicy {
    pub max_attempts: u32,
    pub poll_interval: Duration,
    pub retry_delay: Duration,
}

impl FinalityPolicy {
    /// Zero-delay variant for tests.
    pub fn no_delay(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            poll_interval: Duration::ZERO,
            retry_delay: Duration::ZERO,
        }
    }
}

impl Default for FinalityPolicy {
    fn default() -> Self {
        Self {
            max_attempts: TX_MAX_RETRIES,
            poll_interval: TX_RETRY_INTERVAL,
            retry_delay: TX_RETRY_DELAY,
        }
    }
}

/// Policy for indexer queries: linear backoff, bounded.
///
/// The growing delay gives the indexer time to catch up with a
/// just-finalized transaction. Linear, not exponential: attempt `i` waits
/// `base_delay * (i + 1)` before querying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl QueryPolicy {
    /// Delay to wait before attempt `attempt` (zero-based).
    pub fn delay_before(&self, attempt: u32) -> Duration {
        self.base_delay * (attempt + 1)
    }

    /// Zero-delay variant for tests.
    pub fn no_delay(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
        }
    }
}

impl Default for QueryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: QUERY_MAX_RETRIES,
            base_delay: QUERY_BASE_DELAY,
        }
    }
}
