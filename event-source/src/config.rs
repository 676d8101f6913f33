//! Configuration types for the event-source crate.

use crate::error::{EventSourceError, Result};

/// Configuration for an [`EventSource`](crate::EventSource) pipeline.
///
/// The source itself only needs a connector; this struct sizes the channels
/// the caller creates around it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSourceConfig {
    /// Capacity of the event update channel. A full channel blocks delivery
    /// in the broker's message handler until the consumer catches up.
    /// Default: 100
    pub update_buffer_size: usize,

    /// Capacity of the subscription update channel fed by topology changes
    /// Default: 10
    pub subscription_buffer_size: usize,
}

impl Default for EventSourceConfig {
    fn default() -> Self {
        Self {
            update_buffer_size: 100,
            subscription_buffer_size: 10,
        }
    }
}

impl EventSourceConfig {
    /// Create a config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Small buffers, so a slow consumer throttles the broker quickly
    pub fn low_latency() -> Self {
        Self {
            update_buffer_size: 1,
            subscription_buffer_size: 1,
        }
    }

    /// Large buffers for bursty event streams
    pub fn high_throughput() -> Self {
        Self {
            update_buffer_size: 10_000,
            ..Default::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.update_buffer_size == 0 {
            return Err(EventSourceError::Configuration(
                "Update buffer size must be greater than 0".to_string(),
            ));
        }

        if self.subscription_buffer_size == 0 {
            return Err(EventSourceError::Configuration(
                "Subscription buffer size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn with_update_buffer_size(mut self, size: usize) -> Self {
        self.update_buffer_size = size;
        self
    }

    pub fn with_subscription_buffer_size(mut self, size: usize) -> Self {
        self.subscription_buffer_size = size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EventSourceConfig::default();
        assert_eq!(config.update_buffer_size, 100);
        assert_eq!(config.subscription_buffer_size, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let invalid = EventSourceConfig::new().with_update_buffer_size(0);
        assert!(matches!(
            invalid.validate(),
            Err(EventSourceError::Configuration(_))
        ));

        let invalid = EventSourceConfig::new().with_subscription_buffer_size(0);
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_config_presets() {
        assert_eq!(EventSourceConfig::low_latency().update_buffer_size, 1);
        assert!(EventSourceConfig::low_latency().validate().is_ok());

        let fast = EventSourceConfig::high_throughput();
        assert_eq!(fast.update_buffer_size, 10_000);
        assert_eq!(fast.subscription_buffer_size, 10);
    }
}
