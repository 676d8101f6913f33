//! Connection settings for the NATS connector.

use std::time::Duration;

/// Default server address used when nothing else is configured.
pub const DEFAULT_NATS_URL: &str = "nats://localhost:4222";

/// Configuration for [`NatsConnector::connect`](crate::NatsConnector::connect).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NatsConfig {
    /// Server URL
    /// Default: nats://localhost:4222
    pub url: String,

    /// Client name reported to the server for identification
    /// Default: None
    pub client_name: Option<String>,

    /// How long to wait for the initial connection
    /// Default: 10 seconds
    pub connect_timeout: Duration,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_NATS_URL.to_string(),
            client_name: None,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl NatsConfig {
    /// Create a config for the server at `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = Some(name.into());
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NatsConfig::default();
        assert_eq!(config.url, "nats://localhost:4222");
        assert_eq!(config.client_name, None);
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_builder_pattern() {
        let config = NatsConfig::new("nats://cp-nats:4222")
            .with_client_name("webhook-service")
            .with_connect_timeout(Duration::from_secs(2));

        assert_eq!(config.url, "nats://cp-nats:4222");
        assert_eq!(config.client_name.as_deref(), Some("webhook-service"));
        assert_eq!(config.connect_timeout, Duration::from_secs(2));
    }
}
