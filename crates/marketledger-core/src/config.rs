//! Polling configuration.

use std::time::Duration;

/// Default unread-count polling interval.
pub const DEFAULT_UNREAD_INTERVAL: Duration = Duration::from_secs(30);

/// Default open-conversation polling interval.
pub const DEFAULT_CONVERSATION_INTERVAL: Duration = Duration::from_secs(5);

/// Intervals for the messaging poll loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingConfig {
    /// How often unread counts are refreshed while signed in.
    pub unread_interval: Duration,
    /// How often the open conversation's messages are refreshed.
    pub conversation_interval: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            unread_interval: DEFAULT_UNREAD_INTERVAL,
            conversation_interval: DEFAULT_CONVERSATION_INTERVAL,
        }
    }
}

impl PollingConfig {
    /// Creates a configuration builder.
    #[must_use]
    pub fn builder() -> PollingConfigBuilder {
        PollingConfigBuilder::new()
    }
}

/// Builder for polling configuration.
#[derive(Debug, Clone, Default)]
pub struct PollingConfigBuilder {
    config: PollingConfig,
}

impl PollingConfigBuilder {
    /// Creates a new builder with default intervals.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the unread-count interval.
    #[must_use]
    pub const fn unread_interval(mut self, interval: Duration) -> Self {
        self.config.unread_interval = interval;
        self
    }

    /// Sets the open-conversation interval.
    #[must_use]
    pub const fn conversation_interval(mut self, interval: Duration) -> Self {
        self.config.conversation_interval = interval;
        self
    }

    /// Builds the configuration.
    ///
    /// Zero intervals fall back to the defaults.
    #[must_use]
    pub fn build(self) -> PollingConfig {
        let PollingConfig {
            unread_interval,
            conversation_interval,
        } = self.config;
        PollingConfig {
            unread_interval: if unread_interval.is_zero() {
                DEFAULT_UNREAD_INTERVAL
            } else {
                unread_interval
            },
            conversation_interval: if conversation_interval.is_zero() {
                DEFAULT_CONVERSATION_INTERVAL
            } else {
                conversation_interval
            },
        }
    }
}
