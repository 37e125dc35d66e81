//! Configuration for the status poller.

use std::time::Duration;

/// Default delay between polls: 2 seconds.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);

/// Default budget of consecutive not-found responses before giving up.
pub const DEFAULT_MAX_NOT_FOUND: u32 = 10;

/// Configuration for [`StatusPoller`](crate::StatusPoller) behavior.
///
/// The poller's timeout concept is the not-found budget, not wall-clock
/// time; per-request timeouts belong to the HTTP collaborator.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay between consecutive polls.
    pub interval: Duration,
    /// Maximum number of consecutive 404 responses before the session
    /// fails with a retries-exhausted error.
    pub max_not_found: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            max_not_found: DEFAULT_MAX_NOT_FOUND,
        }
    }
}

impl PollConfig {
    /// Create a configuration with the given interval and not-found budget.
    pub fn new(interval: Duration, max_not_found: u32) -> Self {
        Self {
            interval,
            max_not_found,
        }
    }

    /// Set the delay between polls.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the budget of consecutive not-found responses.
    pub fn with_max_not_found(mut self, max_not_found: u32) -> Self {
        self.max_not_found = max_not_found;
        self
    }

    /// Returns the effective not-found budget, treating zero as one.
    ///
    /// A zero budget would fail a session before its first 404 could be
    /// observed.
    pub fn effective_max_not_found(&self) -> u32 {
        self.max_not_found.max(1)
    }
}
