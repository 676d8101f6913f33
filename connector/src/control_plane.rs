//! The control-plane loop tying subscriptions, events and the integration
//! together.

use std::sync::Arc;

use async_trait::async_trait;
use event_source::{
    CancellationToken, ControlPlaneEvent, EventSender, EventSource, EventSourceConfig,
    EventUpdate, RegistrationData,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::error::Result;

/// Error type returned by integration handlers.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Business logic invoked for every received event.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handle one event. `sender` publishes follow-up events.
    async fn on_event(
        &self,
        event: ControlPlaneEvent,
        sender: EventSender,
    ) -> std::result::Result<(), HandlerError>;
}

/// Producer of subscription updates.
///
/// Each list sent replaces the subscribed subjects wholesale.
#[async_trait]
pub trait SubscriptionSource: Send + Sync {
    /// Send subject lists on `updates` until `cancel` fires or there is
    /// nothing more to send.
    async fn run(&self, cancel: CancellationToken, updates: mpsc::Sender<Vec<String>>);
}

/// Subscription source that emits one fixed subject list.
#[derive(Debug, Clone, Default)]
pub struct StaticSubscriptionSource {
    subjects: Vec<String>,
}

impl StaticSubscriptionSource {
    pub fn new(subjects: Vec<String>) -> Self {
        Self { subjects }
    }
}

#[async_trait]
impl SubscriptionSource for StaticSubscriptionSource {
    async fn run(&self, cancel: CancellationToken, updates: mpsc::Sender<Vec<String>>) {
        tokio::select! {
            _ = cancel.cancelled() => {}
            result = updates.send(self.subjects.clone()) => {
                if result.is_err() {
                    debug!("Subscription update receiver dropped");
                }
            }
        }
    }
}

/// Runs an integration against the control plane.
///
/// # Example
///
/// ```rust,ignore
/// let control_plane = ControlPlane::new(
///     EventSource::new(Arc::new(connector)),
///     Arc::new(StaticSubscriptionSource::new(subjects)),
///     Arc::new(MyHandler),
/// );
///
/// control_plane.run(cancel, registration).await?;
/// ```
pub struct ControlPlane {
    source: EventSource,
    subscriptions: Arc<dyn SubscriptionSource>,
    handler: Arc<dyn EventHandler>,
    config: EventSourceConfig,
}

impl ControlPlane {
    pub fn new(
        source: EventSource,
        subscriptions: Arc<dyn SubscriptionSource>,
        handler: Arc<dyn EventHandler>,
    ) -> Self {
        Self {
            source,
            subscriptions,
            handler,
            config: EventSourceConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EventSourceConfig) -> Self {
        self.config = config;
        self
    }

    /// The event source driven by this control plane.
    pub fn source(&self) -> &EventSource {
        &self.source
    }

    /// Start the event source and process until `cancel` fires.
    ///
    /// Subscription updates are applied in the order received. Events are
    /// handed to the handler one at a time; handler failures and background
    /// event-source errors are logged and never end the loop.
    ///
    /// # Errors
    ///
    /// Fails only if the configuration is invalid or the event source cannot
    /// be started.
    pub async fn run(&self, cancel: CancellationToken, registration: RegistrationData) -> Result<()> {
        self.config.validate()?;

        let (subscription_tx, mut subscription_rx) =
            mpsc::channel(self.config.subscription_buffer_size);
        let (update_tx, mut update_rx) = mpsc::channel(self.config.update_buffer_size);
        let (error_tx, mut error_rx) = mpsc::unbounded_channel();

        let name = registration.name.clone();
        self.source
            .start(cancel.clone(), registration, update_tx, error_tx)
            .await?;

        let subscriptions = self.subscriptions.clone();
        let subscription_cancel = cancel.clone();
        let subscription_task = tokio::spawn(async move {
            subscriptions.run(subscription_cancel, subscription_tx).await;
        });

        let sender = self.source.sender();
        let mut subscriptions_open = true;
        let mut updates_open = true;
        let mut errors_open = true;

        info!(name = %name, "Control plane running");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!(name = %name, "Control plane cancelled");
                    break;
                }
                subjects = subscription_rx.recv(), if subscriptions_open => match subjects {
                    Some(subjects) => self.source.on_subscription_update(subjects).await,
                    None => {
                        debug!("Subscription source finished");
                        subscriptions_open = false;
                    }
                },
                update = update_rx.recv(), if updates_open => match update {
                    Some(update) => self.dispatch(update, &sender).await,
                    None => updates_open = false,
                },
                err = error_rx.recv(), if errors_open => match err {
                    Some(err) => warn!(error = %err, "Event source error"),
                    None => errors_open = false,
                },
            }
        }

        if let Err(e) = subscription_task.await {
            warn!(error = %e, "Subscription source task failed");
        }

        Ok(())
    }

    async fn dispatch(&self, update: EventUpdate, sender: &EventSender) {
        let event_type = update.event.event_type().unwrap_or_default().to_string();
        debug!(subject = %update.subject(), event_type = %event_type, "Dispatching event");

        if let Err(e) = self.handler.on_event(update.event, sender.clone()).await {
            error!(event_type = %event_type, error = %e, "Event handler failed");
        }
    }
}

impl std::fmt::Debug for ControlPlane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlPlane")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
