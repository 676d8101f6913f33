//! The message handler installed on every subscription.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::connector::ProcessMessage;
use crate::error::ProcessError;
use crate::event::ControlPlaneEvent;
use crate::types::{EventUpdate, Message};

/// Decodes delivered messages and forwards them as [`EventUpdate`]s.
///
/// Malformed payloads are logged and dropped. Forwarding waits for room in the
/// update channel, so a slow consumer holds up the delivering subscription.
pub(crate) struct ForwardingHandler {
    updates: mpsc::Sender<EventUpdate>,
}

impl ForwardingHandler {
    pub(crate) fn new(updates: mpsc::Sender<EventUpdate>) -> Self {
        Self { updates }
    }
}

#[async_trait]
impl ProcessMessage for ForwardingHandler {
    async fn process(&self, message: Message) -> Result<(), ProcessError> {
        let event = match ControlPlaneEvent::from_json(&message.payload) {
            Ok(event) => event,
            Err(e) => {
                warn!(subject = %message.subject, error = %e, "Dropping undecodable message");
                return Err(ProcessError::Decode {
                    subject: message.subject,
                    reason: e.to_string(),
                });
            }
        };

        debug!(
            subject = %message.subject,
            id = event.id.as_deref().unwrap_or_default(),
            "Forwarding event"
        );

        self.updates
            .send(EventUpdate::new(event, message.subject))
            .await
            .map_err(|_| ProcessError::ChannelClosed)
    }
}
