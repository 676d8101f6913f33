//! Error types for the NATS connector.

use event_source::ConnectorError;

/// Errors produced by [`NatsConnector`](crate::NatsConnector).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NatsError {
    /// The initial connection could not be established
    #[error("Could not connect to NATS at {url}: {reason}")]
    Connect { url: String, reason: String },

    /// The connection was already closed with `disconnect`
    #[error("Not connected to NATS")]
    NotConnected,

    /// A subscription was requested for an empty subject
    #[error("Could not subscribe to topic: topic must not be empty")]
    EmptySubject,

    /// The subject already has an active subscription on this connection
    #[error("Already subscribed to topic {0}")]
    AlreadySubscribed(String),

    /// The server rejected the subscription
    #[error("Could not subscribe to topic {subject}: {reason}")]
    Subscribe { subject: String, reason: String },

    /// One or more subscriptions could not be removed
    #[error("Could not unsubscribe from topics: {}", .subjects.join(", "))]
    Unsubscribe { subjects: Vec<String> },

    /// The event has no type, so there is no subject to publish on
    #[error("Could not publish event: event type missing")]
    EventTypeMissing,

    /// The event could not be serialized
    #[error("Could not encode event: {0}")]
    Encode(String),

    /// The publish did not reach the server
    #[error("Could not publish event to {subject}: {reason}")]
    Publish { subject: String, reason: String },

    /// Draining the connection while disconnecting failed
    #[error("Could not drain connection: {0}")]
    Drain(String),
}

impl From<NatsError> for ConnectorError {
    fn from(error: NatsError) -> Self {
        match error {
            NatsError::NotConnected => ConnectorError::NotConnected,
            NatsError::EmptySubject => ConnectorError::SubscribeFailed {
                subject: String::new(),
                reason: error.to_string(),
            },
            NatsError::AlreadySubscribed(ref subject) => ConnectorError::SubscribeFailed {
                subject: subject.clone(),
                reason: error.to_string(),
            },
            NatsError::Subscribe { subject, reason } => {
                ConnectorError::SubscribeFailed { subject, reason }
            }
            NatsError::Unsubscribe { .. } => ConnectorError::UnsubscribeFailed(error.to_string()),
            NatsError::EventTypeMissing | NatsError::Encode(_) => {
                ConnectorError::Encode(error.to_string())
            }
            NatsError::Publish { .. } => ConnectorError::PublishFailed(error.to_string()),
            NatsError::Drain(_) => ConnectorError::DisconnectFailed(error.to_string()),
            NatsError::Connect { .. } => ConnectorError::Other(error.to_string()),
        }
    }
}

/// Convenience type alias for Results using NatsError.
pub type Result<T> = std::result::Result<T, NatsError>;
