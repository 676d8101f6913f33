//! Publish path of the event source.

use std::sync::Arc;

use tracing::debug;

use crate::connector::BrokerConnector;
use crate::error::ConnectorError;
use crate::event::ControlPlaneEvent;

/// Publishes events through the event source's connector.
///
/// One call to [`send`](Self::send) is exactly one broker publish. There is no
/// retry and no buffering; the connector's error is returned as is.
#[derive(Clone)]
pub struct EventSender {
    connector: Arc<dyn BrokerConnector>,
}

impl EventSender {
    pub(crate) fn new(connector: Arc<dyn BrokerConnector>) -> Self {
        Self { connector }
    }

    /// Publish one event.
    pub async fn send(&self, event: ControlPlaneEvent) -> Result<(), ConnectorError> {
        debug!(event_type = event.event_type().unwrap_or_default(), "Publishing event");
        self.connector.publish(event).await
    }
}

impl std::fmt::Debug for EventSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSender").finish_non_exhaustive()
    }
}
