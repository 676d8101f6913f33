//! Error types for the event-source crate.

/// Errors reported by a [`BrokerConnector`](crate::BrokerConnector) implementation.
///
/// The event source never interprets these beyond routing them: errors from
/// synchronous calls are returned unchanged, errors from background work are
/// wrapped in an [`EventSourceError`] and pushed onto the error channel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectorError {
    /// The broker connection is not available
    #[error("Not connected to broker")]
    NotConnected,

    /// Subscribing to a subject failed
    #[error("Could not subscribe to subject {subject}: {reason}")]
    SubscribeFailed {
        /// The subject that could not be subscribed
        subject: String,
        /// Underlying failure reason
        reason: String,
    },

    /// One or more subscriptions could not be removed
    #[error("Unsubscribe failed: {0}")]
    UnsubscribeFailed(String),

    /// The event could not be encoded for the wire
    #[error("Could not encode event: {0}")]
    Encode(String),

    /// The broker rejected or failed to accept a publish
    #[error("Publish failed: {0}")]
    PublishFailed(String),

    /// Closing the connection failed
    #[error("Disconnect failed: {0}")]
    DisconnectFailed(String),

    /// Any other broker failure
    #[error("Broker error: {0}")]
    Other(String),
}

/// Errors from the internal message handler.
///
/// Connectors log these; they are never forwarded to the application.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// The payload was not a valid event
    #[error("Could not decode message on subject {subject}: {reason}")]
    Decode {
        /// Subject the message was delivered on
        subject: String,
        /// Decoder error message
        reason: String,
    },

    /// Nobody is reading event updates any more
    #[error("Event update channel closed")]
    ChannelClosed,
}

/// Errors produced by the [`EventSource`](crate::EventSource).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventSourceError {
    /// The initial queue subscription failed
    #[error("Could not start event source: {0}")]
    Start(#[source] ConnectorError),

    /// `start` was called on a source that is already running
    #[error("Event source already started")]
    AlreadyStarted,

    /// Unsubscribing during a subscription update failed
    #[error("Could not remove subscriptions during update: {0}")]
    UpdateUnsubscribe(#[source] ConnectorError),

    /// Resubscribing during a subscription update failed
    #[error("Could not subscribe during update: {0}")]
    UpdateSubscribe(#[source] ConnectorError),

    /// Unsubscribing after cancellation failed
    #[error("Could not unsubscribe on shutdown: {0}")]
    Teardown(#[source] ConnectorError),

    /// Invalid configuration values
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Convenience type alias for Results using EventSourceError.
pub type Result<T> = std::result::Result<T, EventSourceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_connector_error_display() {
        let error = ConnectorError::SubscribeFailed {
            subject: "cp.event.>".to_string(),
            reason: "connection refused".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Could not subscribe to subject cp.event.>: connection refused"
        );

        assert_eq!(ConnectorError::NotConnected.to_string(), "Not connected to broker");

        let error = ConnectorError::PublishFailed("timeout".to_string());
        assert_eq!(error.to_string(), "Publish failed: timeout");
    }

    #[test]
    fn test_process_error_display() {
        let error = ProcessError::Decode {
            subject: "a".to_string(),
            reason: "expected value".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Could not decode message on subject a: expected value"
        );
        assert_eq!(ProcessError::ChannelClosed.to_string(), "Event update channel closed");
    }

    #[test]
    fn test_event_source_error_keeps_source() {
        let error = EventSourceError::UpdateUnsubscribe(ConnectorError::UnsubscribeFailed(
            "a".to_string(),
        ));
        assert!(error.to_string().starts_with("Could not remove subscriptions during update"));

        let source = error.source().expect("source");
        assert_eq!(source.to_string(), "Unsubscribe failed: a");
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_error() -> Result<()> {
            Err(EventSourceError::AlreadyStarted)
        }

        assert!(matches!(returns_error(), Err(EventSourceError::AlreadyStarted)));
    }
}
