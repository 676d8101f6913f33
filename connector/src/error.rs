use thiserror::Error;

use crate::logging::LoggingError;

/// Errors that can occur while running the connector
#[derive(Error, Debug)]
pub enum ConnectorAppError {
    /// The event source could not be started
    #[error("Event source error: {0}")]
    EventSource(#[from] event_source::EventSourceError),

    /// A broker operation failed
    #[error("Broker error: {0}")]
    Broker(#[from] event_source::ConnectorError),

    /// Connecting to NATS failed
    #[error("NATS error: {0}")]
    Nats(#[from] nats_connector::NatsError),

    /// The control-plane API client could not be created
    #[error("API client error: {0}")]
    Api(#[from] api_client::ApiError),

    /// Logging could not be initialized
    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type for connector operations
pub type Result<T> = std::result::Result<T, ConnectorAppError>;
