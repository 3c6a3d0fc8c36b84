//! Rate-limit backoff
//!
//! The backoff is engine-wide rather than per host: one server answering 429
//! slows the whole crawl. It lives in memory only, so a restart resets it.

use std::time::Duration;

/// The initial backoff is this many times the per-request sleep
pub const BACKOFF_MULTIPLIER: u32 = 10;

/// Escalating delay applied after rate-limit responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    initial: Duration,
    current: Duration,
}

impl Backoff {
    /// Creates a backoff starting at `sleep_time * 10`
    pub fn new(sleep_time: Duration) -> Self {
        let initial = sleep_time.saturating_mul(BACKOFF_MULTIPLIER);
        Self {
            initial,
            current: initial,
        }
    }

    /// The delay the next rate-limit response will wait
    pub fn current(&self) -> Duration {
        self.current
    }

    pub fn initial(&self) -> Duration {
        self.initial
    }

    /// Returns the delay to wait now and doubles it for next time
    pub fn escalate(&mut self) -> Duration {
        let wait = self.current;
        self.current = self.current.saturating_mul(2);
        wait
    }

    /// Drops back to the initial delay
    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}
