//! Broker capability interface.
//!
//! The event source is written entirely against [`BrokerConnector`]. Production
//! code binds it to a real broker client (see the `nats-connector` crate), tests
//! bind it to a programmable stub.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{ConnectorError, ProcessError};
use crate::event::ControlPlaneEvent;
use crate::types::Message;

/// Callback invoked by a connector for every delivered message.
///
/// Connectors call `process` from their own delivery tasks, potentially
/// concurrently for different subscriptions. Awaiting inside `process` holds up
/// delivery on that subscription only.
#[async_trait]
pub trait ProcessMessage: Send + Sync {
    /// Handle one delivered message.
    async fn process(&self, message: Message) -> Result<(), ProcessError>;
}

/// Shared handle to a message handler.
pub type MessageHandler = Arc<dyn ProcessMessage>;

/// The minimal set of broker operations the event source needs.
///
/// # Thread Safety
///
/// Implementations must tolerate concurrent calls to distinct operations
/// (subscribe family, publish, disconnect), since the subscription update path
/// and the publish path run independently.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BrokerConnector: Send + Sync {
    /// Subscribe `handler` to a single subject without queue-group sharing.
    async fn subscribe(&self, subject: &str, handler: MessageHandler)
        -> Result<(), ConnectorError>;

    /// Subscribe `handler` to a single subject, sharing delivery with every
    /// other subscriber in `queue_group`.
    async fn queue_subscribe(
        &self,
        subject: &str,
        queue_group: &str,
        handler: MessageHandler,
    ) -> Result<(), ConnectorError>;

    /// Subscribe `handler` to every subject in `subjects`.
    ///
    /// Not atomic: implementations may subscribe some subjects before failing
    /// on a later one. Callers treat a failure as indeterminate state.
    async fn subscribe_multiple(
        &self,
        subjects: &[String],
        handler: MessageHandler,
    ) -> Result<(), ConnectorError>;

    /// Queue-group form of [`subscribe_multiple`](Self::subscribe_multiple).
    async fn queue_subscribe_multiple(
        &self,
        subjects: &[String],
        queue_group: &str,
        handler: MessageHandler,
    ) -> Result<(), ConnectorError>;

    /// Encode and publish one event.
    async fn publish(&self, event: ControlPlaneEvent) -> Result<(), ConnectorError>;

    /// Close the broker connection.
    async fn disconnect(&self) -> Result<(), ConnectorError>;

    /// Remove every subscription held by this connector.
    ///
    /// Best effort: every subscription is attempted, a single aggregate error
    /// is returned if any of them failed.
    async fn unsubscribe_all(&self) -> Result<(), ConnectorError>;
}
