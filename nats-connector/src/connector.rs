//! NATS implementation of the broker connector.

use async_nats::{Client, Subscriber};
use async_trait::async_trait;
use event_source::{
    BrokerConnector, ConnectorError, ControlPlaneEvent, Message, MessageHandler, ProcessError,
};
use futures::StreamExt;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::NatsConfig;
use crate::error::{NatsError, Result};
use crate::registry::{ActiveSubscription, DeliveryResult, SubscriptionRegistry};

/// Broker connector backed by a NATS connection.
///
/// Each subscribed subject gets its own delivery task that feeds incoming
/// messages to the handler one at a time. A subject can be subscribed at most
/// once per connector until [`unsubscribe_all`](BrokerConnector::unsubscribe_all)
/// clears the registry.
///
/// # Example
///
/// ```rust,ignore
/// let connector = NatsConnector::connect(NatsConfig::new("nats://localhost:4222")).await?;
/// let source = EventSource::new(Arc::new(connector));
/// ```
pub struct NatsConnector {
    url: String,
    /// `None` once disconnected
    client: RwLock<Option<Client>>,
    subscriptions: Mutex<SubscriptionRegistry>,
}

impl NatsConnector {
    /// Connect to the server described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `NatsError::Connect` if the server cannot be reached within
    /// the configured timeout.
    pub async fn connect(config: NatsConfig) -> Result<Self> {
        info!(url = %config.url, "Connecting to NATS");

        let mut options = async_nats::ConnectOptions::new();
        if let Some(name) = &config.client_name {
            options = options.name(name);
        }

        let client = tokio::time::timeout(config.connect_timeout, options.connect(config.url.as_str()))
            .await
            .map_err(|_| NatsError::Connect {
                url: config.url.clone(),
                reason: format!("timed out after {:?}", config.connect_timeout),
            })?
            .map_err(|e| NatsError::Connect {
                url: config.url.clone(),
                reason: e.to_string(),
            })?;

        info!(url = %config.url, "Connected to NATS");

        Ok(Self {
            url: config.url,
            client: RwLock::new(Some(client)),
            subscriptions: Mutex::new(SubscriptionRegistry::new()),
        })
    }

    /// The server URL this connector was created for.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Subjects with an active subscription, sorted.
    pub async fn subjects(&self) -> Vec<String> {
        self.subscriptions.lock().await.subjects()
    }

    async fn client(&self) -> Result<Client> {
        self.client.read().await.clone().ok_or(NatsError::NotConnected)
    }

    async fn subscribe_subject(
        &self,
        subject: &str,
        queue_group: Option<&str>,
        handler: MessageHandler,
    ) -> Result<()> {
        let mut registry = self.subscriptions.lock().await;
        registry.check_available(subject)?;

        let client = self.client().await?;
        let subscribed = match queue_group {
            Some(group) => {
                client
                    .queue_subscribe(subject.to_string(), group.to_string())
                    .await
            }
            None => client.subscribe(subject.to_string()).await,
        };
        let subscriber = subscribed.map_err(|e| NatsError::Subscribe {
            subject: subject.to_string(),
            reason: e.to_string(),
        })?;

        let cancel = CancellationToken::new();
        let task = tokio::spawn(deliver(subscriber, handler, cancel.clone()));
        registry.insert(subject.to_string(), ActiveSubscription::new(cancel, task));

        debug!(subject = %subject, queue_group = queue_group.unwrap_or_default(), "Subscribed");
        Ok(())
    }

    /// Subscribe every subject in order, or none of them.
    ///
    /// On the first failure the subjects added by this call are closed again
    /// before the error is returned.
    async fn subscribe_subjects(
        &self,
        subjects: &[String],
        queue_group: Option<&str>,
        handler: MessageHandler,
    ) -> Result<()> {
        let mut added = Vec::with_capacity(subjects.len());

        for subject in subjects {
            if let Err(e) = self
                .subscribe_subject(subject, queue_group, handler.clone())
                .await
            {
                if !added.is_empty() {
                    warn!(subject = %subject, rolled_back = ?added, "Subscribe failed, removing subjects added so far");
                    if let Err(rollback) = self.subscriptions.lock().await.close_subjects(&added).await {
                        warn!(error = %rollback, "Could not roll back partial subscribe");
                    }
                }
                return Err(e);
            }
            added.push(subject.clone());
        }

        Ok(())
    }

    async fn publish_event(&self, event: ControlPlaneEvent) -> Result<()> {
        let subject = event
            .event_type()
            .ok_or(NatsError::EventTypeMissing)?
            .to_string();
        let payload = event.to_json().map_err(|e| NatsError::Encode(e.to_string()))?;

        let client = self.client().await?;
        client
            .publish(subject.clone(), payload.into())
            .await
            .map_err(|e| NatsError::Publish {
                subject: subject.clone(),
                reason: e.to_string(),
            })?;

        debug!(subject = %subject, "Published event");
        Ok(())
    }

    /// Drain and close the connection.
    ///
    /// Draining unsubscribes every subscription on the server, delivers what
    /// was already received and flushes pending publishes before the
    /// connection closes. Delivery tasks are then stopped and forgotten.
    async fn close(&self) -> Result<()> {
        let client = self.client.write().await.take().ok_or(NatsError::NotConnected)?;

        let drained = client.drain().await.map_err(|e| NatsError::Drain(e.to_string()));

        let abandoned = self.subscriptions.lock().await.abandon_all();
        if abandoned > 0 {
            debug!(count = abandoned, "Stopped delivery tasks of closed connection");
        }

        drained?;
        info!(url = %self.url, "Disconnected from NATS");
        Ok(())
    }
}

impl std::fmt::Debug for NatsConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NatsConnector")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

/// Feed messages from `subscriber` to `handler` until cancelled or closed.
///
/// Handler failures are logged and delivery continues. On cancellation the
/// subscription is removed from the server, abandoning a message the handler
/// is still waiting to hand off.
async fn deliver(
    mut subscriber: Subscriber,
    handler: MessageHandler,
    cancel: CancellationToken,
) -> DeliveryResult {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                return subscriber.unsubscribe().await.map_err(|e| e.to_string());
            }
            next = subscriber.next() => match next {
                Some(msg) => {
                    let subject = msg.subject.to_string();
                    let message = Message::new(subject.clone(), msg.payload);
                    // A handler blocked on a full update channel must not hold up unsubscribe.
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            debug!(subject = %subject, "Dropping in-flight message on unsubscribe");
                            return subscriber.unsubscribe().await.map_err(|e| e.to_string());
                        }
                        result = handler.process(message) => match result {
                            Ok(()) => {}
                            Err(ProcessError::Decode { .. }) => {
                                debug!(subject = %subject, "Message dropped by handler");
                            }
                            Err(e) => warn!(subject = %subject, error = %e, "Message handler failed"),
                        }
                    }
                }
                None => {
                    debug!("Subscription closed by server");
                    return Ok(());
                }
            }
        }
    }
}

#[async_trait]
impl BrokerConnector for NatsConnector {
    async fn subscribe(
        &self,
        subject: &str,
        handler: MessageHandler,
    ) -> std::result::Result<(), ConnectorError> {
        Ok(self.subscribe_subject(subject, None, handler).await?)
    }

    async fn queue_subscribe(
        &self,
        subject: &str,
        queue_group: &str,
        handler: MessageHandler,
    ) -> std::result::Result<(), ConnectorError> {
        Ok(self
            .subscribe_subject(subject, Some(queue_group), handler)
            .await?)
    }

    async fn subscribe_multiple(
        &self,
        subjects: &[String],
        handler: MessageHandler,
    ) -> std::result::Result<(), ConnectorError> {
        Ok(self.subscribe_subjects(subjects, None, handler).await?)
    }

    async fn queue_subscribe_multiple(
        &self,
        subjects: &[String],
        queue_group: &str,
        handler: MessageHandler,
    ) -> std::result::Result<(), ConnectorError> {
        Ok(self
            .subscribe_subjects(subjects, Some(queue_group), handler)
            .await?)
    }

    async fn publish(&self, event: ControlPlaneEvent) -> std::result::Result<(), ConnectorError> {
        Ok(self.publish_event(event).await?)
    }

    async fn disconnect(&self) -> std::result::Result<(), ConnectorError> {
        Ok(self.close().await?)
    }

    async fn unsubscribe_all(&self) -> std::result::Result<(), ConnectorError> {
        Ok(self.subscriptions.lock().await.close_all().await?)
    }
}
