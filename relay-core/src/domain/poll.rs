//! Polling configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default delay between two status fetches
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

/// Default upper bound on the total wait for a run
pub const DEFAULT_POLL_TIMEOUT_MS: u64 = 300_000;

/// Shortest delay the poller waits between two status fetches
pub const MIN_POLL_INTERVAL_MS: u64 = 1;

/// Fixed-interval polling parameters for one orchestration call
///
/// `interval_ms` is expected to be smaller than `timeout_ms`. This is not
/// enforced: with a larger interval the poller simply times out after its
/// first status check. An `interval_ms` of zero is treated as
/// [`MIN_POLL_INTERVAL_MS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    pub interval_ms: u64,
    pub timeout_ms: u64,
}

impl PollConfig {
    pub fn new(interval_ms: u64, timeout_ms: u64) -> Self {
        Self {
            interval_ms,
            timeout_ms,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(MIN_POLL_INTERVAL_MS))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Returns a copy with any provided values replacing the current ones
    pub fn with_overrides(self, interval_ms: Option<u64>, timeout_ms: Option<u64>) -> Self {
        Self {
            interval_ms: interval_ms.unwrap_or(self.interval_ms),
            timeout_ms: timeout_ms.unwrap_or(self.timeout_ms),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL_MS, DEFAULT_POLL_TIMEOUT_MS)
    }
}
