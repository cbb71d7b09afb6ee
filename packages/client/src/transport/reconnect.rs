//! Scheduled-retry strategy for the client transport.
//!
//! The policy only counts attempts and hands out the delay; the transport owns
//! the timer, so the policy can be tested without any I/O.

use std::time::Duration;

/// Automatic reconnect attempts after the connection drops.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Fixed delay before each automatic reconnect attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(3000);

/// Attempt counter with a fixed delay and an upper bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    max_attempts: u32,
    delay: Duration,
    attempts: u32,
}

impl ReconnectPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
            attempts: 0,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Called when a connection opens or a fresh connect is requested.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Consume one attempt and return the delay before it, or `None` once the
    /// budget is spent.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempts >= self.max_attempts {
            return None;
        }
        self.attempts += 1;
        Some(self.delay)
    }

    /// Pin the counter at the maximum so no further attempt is scheduled.
    pub fn exhaust(&mut self) {
        self.attempts = self.max_attempts;
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_RECONNECT_DELAY)
    }
}
