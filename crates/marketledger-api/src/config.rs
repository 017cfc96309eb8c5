//! Client configuration types.

use std::time::Duration;

use url::Url;

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root; always ends with `/` so relative paths join beneath it.
    pub base_url: Url,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Window within which repeated errors with the same status produce a
    /// single notification.
    pub notification_window: Duration,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl ClientConfig {
    /// Creates a configuration with default timeouts.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self::builder(base_url).build()
    }

    /// Creates a configuration builder.
    #[must_use]
    pub fn builder(base_url: Url) -> ClientConfigBuilder {
        ClientConfigBuilder::new(base_url)
    }
}

/// Builder for client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    base_url: Url,
    request_timeout: Duration,
    notification_window: Duration,
    user_agent: String,
}

impl ClientConfigBuilder {
    /// Creates a new builder for the given API root.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            request_timeout: Duration::from_secs(30),
            notification_window: Duration::from_secs(10),
            user_agent: concat!("marketledger/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the notification burst window.
    #[must_use]
    pub const fn notification_window(mut self, window: Duration) -> Self {
        self.notification_window = window;
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> ClientConfig {
        let mut base_url = self.base_url;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        ClientConfig {
            base_url,
            request_timeout: self.request_timeout,
            notification_window: self.notification_window,
            user_agent: self.user_agent,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new(Url::parse("https://market.example/api/").unwrap());
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.notification_window, Duration::from_secs(10));
        assert!(config.user_agent.starts_with("marketledger/"));
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let config = ClientConfig::builder(Url::parse("https://market.example/api").unwrap())
            .request_timeout(Duration::from_secs(5))
            .build();
        assert_eq!(config.base_url.as_str(), "https://market.example/api/");
        assert_eq!(
            config.base_url.join("listings/").unwrap().as_str(),
            "https://market.example/api/listings/"
        );
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }
}
