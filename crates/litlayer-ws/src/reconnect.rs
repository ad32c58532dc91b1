//! Reconnection policy with a fixed delay

use std::time::Duration;

/// Delay the exchange clients have always used between a close and the next attempt
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Configuration for automatic reconnection
///
/// Every attempt waits the same `delay`; there is no backoff growth.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Pause between a close and the next connect attempt
    pub delay: Duration,
    /// Maximum number of consecutive reconnection attempts (None = unlimited)
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            delay: DEFAULT_RECONNECT_DELAY,
            max_attempts: None,
        }
    }
}

impl ReconnectConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the delay between attempts
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Set maximum attempts
    pub fn with_max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = Some(max);
        self
    }

    /// Disable reconnection
    pub fn disabled() -> Self {
        Self {
            max_attempts: Some(0),
            ..Default::default()
        }
    }

    /// Whether any reconnection will ever be attempted
    pub fn is_enabled(&self) -> bool {
        self.max_attempts != Some(0)
    }

    /// Delay before attempt `attempt` (1-indexed); constant
    pub fn delay_for_attempt(&self, _attempt: u32) -> Duration {
        self.delay
    }

    /// Check if should attempt reconnection
    pub fn should_reconnect(&self, attempt: u32) -> bool {
        match self.max_attempts {
            Some(max) => attempt < max,
            None => true,
        }
    }
}
