//! The event source and its subscription update protocol.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::connector::{BrokerConnector, MessageHandler};
use crate::error::{ConnectorError, EventSourceError, Result};
use crate::handler::ForwardingHandler;
use crate::sender::EventSender;
use crate::subjects::SubjectSet;
use crate::types::{EventUpdate, QueueGroup, RegistrationData};

/// Event source over a broker connector.
///
/// The source owns the current subject set and keeps it subscribed under one
/// queue group. It moves through `Created → Started → Stopped`:
///
/// - [`start`](Self::start) subscribes the initial subjects and spawns a
///   watcher bound to the caller's cancellation token.
/// - [`on_subscription_update`](Self::on_subscription_update) replaces the
///   subject set wholesale while started.
/// - Cancelling the token makes the watcher unsubscribe everything once.
///
/// [`stop`](Self::stop) is separate from cancellation: it closes the
/// connector's connection and leaves subscriptions alone. Callers that do
/// both await [`stopped`](Self::stopped) before stopping so the unsubscribe
/// reaches the broker first.
///
/// # Thread Safety
///
/// The source is cheap to clone and all clones share state. Subscription
/// updates and the cancellation teardown are serialized behind one async
/// mutex, so the broker always ends up with exactly one caller's subject list.
///
/// # Example
///
/// ```rust,ignore
/// let source = EventSource::new(Arc::new(connector));
/// let (updates_tx, mut updates) = mpsc::channel(100);
/// let (errors_tx, mut errors) = mpsc::unbounded_channel();
///
/// source
///     .start(cancel.clone(), registration, updates_tx, errors_tx)
///     .await?;
///
/// source.on_subscription_update(vec!["cp.event.deployment.triggered".into()]).await;
///
/// while let Some(update) = updates.recv().await {
///     // Handle update
/// }
/// ```
#[derive(Clone)]
pub struct EventSource {
    connector: Arc<dyn BrokerConnector>,
    state: Arc<Mutex<SourceState>>,
    /// Fired by the watcher once teardown has finished
    torn_down: CancellationToken,
}

#[derive(Default)]
struct SourceState {
    phase: Phase,
    subjects: SubjectSet,
}

#[derive(Default)]
enum Phase {
    #[default]
    Created,
    Started(Running),
    Stopped,
}

/// Everything fixed at start and reused by every update.
struct Running {
    queue_group: QueueGroup,
    handler: MessageHandler,
    errors: mpsc::UnboundedSender<EventSourceError>,
    cancel: CancellationToken,
}

impl EventSource {
    /// Create an event source over `connector`.
    pub fn new(connector: Arc<dyn BrokerConnector>) -> Self {
        Self {
            connector,
            state: Arc::new(Mutex::new(SourceState::default())),
            torn_down: CancellationToken::new(),
        }
    }

    /// Subscribe the registration's subjects and start watching `cancel`.
    ///
    /// The initial subjects are deduplicated and subscribed with a single
    /// queue-subscribe call under the queue group derived from the
    /// registration name. Every delivered message is decoded and sent on
    /// `updates`; background failures are sent on `errors`.
    ///
    /// # Errors
    ///
    /// * `EventSourceError::Start` - The initial subscribe failed. Nothing is
    ///   retained and no watcher is spawned.
    /// * `EventSourceError::AlreadyStarted` - The source was started before.
    pub async fn start(
        &self,
        cancel: CancellationToken,
        registration: RegistrationData,
        updates: mpsc::Sender<EventUpdate>,
        errors: mpsc::UnboundedSender<EventSourceError>,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        if !matches!(state.phase, Phase::Created) {
            return Err(EventSourceError::AlreadyStarted);
        }

        let subjects = SubjectSet::new(registration.subjects.iter().cloned());
        let queue_group = registration.queue_group();
        let handler: MessageHandler = Arc::new(ForwardingHandler::new(updates));

        self.connector
            .queue_subscribe_multiple(subjects.as_slice(), queue_group.as_str(), handler.clone())
            .await
            .map_err(EventSourceError::Start)?;

        info!(
            name = %registration.name,
            queue_group = %queue_group,
            subjects = ?subjects.as_slice(),
            "Event source started"
        );

        state.subjects = subjects;
        state.phase = Phase::Started(Running {
            queue_group,
            handler,
            errors: errors.clone(),
            cancel: cancel.clone(),
        });
        drop(state);

        tokio::spawn(watch_cancellation(
            self.connector.clone(),
            self.state.clone(),
            cancel,
            errors,
            self.torn_down.clone(),
        ));

        Ok(())
    }

    /// Replace the subscribed subjects with `subjects`.
    ///
    /// Runs unsubscribe-all followed by one queue-subscribe of the
    /// deduplicated list, reusing the queue group and handler from
    /// [`start`](Self::start). A failed unsubscribe is reported and the
    /// subscribe is still attempted. A failed subscribe is reported and leaves
    /// the source without subscriptions until the next successful update.
    /// Failures never stop the source; they are sent on the error channel.
    ///
    /// Updates before `start` or after cancellation are ignored.
    pub async fn on_subscription_update(&self, subjects: Vec<String>) {
        let subjects = SubjectSet::new(subjects);
        let mut state = self.state.lock().await;

        let (queue_group, handler, errors) = match &state.phase {
            Phase::Started(running) if !running.cancel.is_cancelled() => (
                running.queue_group.clone(),
                running.handler.clone(),
                running.errors.clone(),
            ),
            _ => {
                warn!(subjects = ?subjects.as_slice(), "Ignoring subscription update, event source is not running");
                return;
            }
        };

        debug!(subjects = ?subjects.as_slice(), "Updating subscriptions");

        if let Err(e) = self.connector.unsubscribe_all().await {
            error!(error = %e, "Could not remove subscriptions during update");
            report(&errors, EventSourceError::UpdateUnsubscribe(e));
        }

        match self
            .connector
            .queue_subscribe_multiple(subjects.as_slice(), queue_group.as_str(), handler)
            .await
        {
            Ok(()) => {
                info!(subjects = ?subjects.as_slice(), "Subscriptions updated");
                state.subjects = subjects;
            }
            Err(e) => {
                error!(error = %e, "Could not subscribe during update");
                report(&errors, EventSourceError::UpdateSubscribe(e));
                state.subjects = SubjectSet::default();
            }
        }
    }

    /// Get a publish handle sharing this source's connector.
    pub fn sender(&self) -> EventSender {
        EventSender::new(self.connector.clone())
    }

    /// Close the connector's connection.
    ///
    /// Does not unsubscribe; that only happens on cancellation. The
    /// connector's error is returned unchanged.
    pub async fn stop(&self) -> std::result::Result<(), ConnectorError> {
        info!("Disconnecting event source from broker");
        self.connector.disconnect().await
    }

    /// Wait until the cancellation teardown has finished.
    ///
    /// Resolves after the watcher's unsubscribe-all returned, whatever its
    /// outcome. Never resolves for a source that was not started.
    pub async fn stopped(&self) {
        self.torn_down.cancelled().await;
    }

    /// The subjects currently believed to be subscribed.
    pub async fn subjects(&self) -> SubjectSet {
        self.state.lock().await.subjects.clone()
    }

    /// Whether the source is started and its token has not fired.
    pub async fn is_running(&self) -> bool {
        match &self.state.lock().await.phase {
            Phase::Started(running) => !running.cancel.is_cancelled(),
            _ => false,
        }
    }
}

impl std::fmt::Debug for EventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSource").finish_non_exhaustive()
    }
}

/// Wait for cancellation, then unsubscribe everything exactly once.
async fn watch_cancellation(
    connector: Arc<dyn BrokerConnector>,
    state: Arc<Mutex<SourceState>>,
    cancel: CancellationToken,
    errors: mpsc::UnboundedSender<EventSourceError>,
    torn_down: CancellationToken,
) {
    cancel.cancelled().await;

    let mut state = state.lock().await;
    state.phase = Phase::Stopped;
    state.subjects = SubjectSet::default();

    match connector.unsubscribe_all().await {
        Ok(()) => debug!("Unsubscribed from broker"),
        Err(e) => {
            error!(error = %e, "Unable to unsubscribe from broker");
            report(&errors, EventSourceError::Teardown(e));
        }
    }
    drop(state);

    torn_down.cancel();
}

fn report(errors: &mpsc::UnboundedSender<EventSourceError>, error: EventSourceError) {
    if errors.send(error).is_err() {
        debug!("Error channel closed, dropping error");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::MockBrokerConnector;
    use crate::event::ControlPlaneEvent;
    use std::time::Duration;

    #[tokio::test]
    async fn test_sender_publishes_exact_event() {
        let event = ControlPlaneEvent::new("id", "something");
        let expected = event.clone();

        let mut mock = MockBrokerConnector::new();
        mock.expect_publish()
            .withf(move |e| *e == expected)
            .times(1)
            .returning(|_| Ok(()));

        let source = EventSource::new(Arc::new(mock));

        assert_eq!(source.sender().send(event).await, Ok(()));
    }

    #[tokio::test]
    async fn test_sender_returns_publish_error_unchanged() {
        let mut mock = MockBrokerConnector::new();
        mock.expect_publish()
            .times(1)
            .returning(|_| Err(ConnectorError::PublishFailed("error occurred".to_string())));

        let source = EventSource::new(Arc::new(mock));
        let result = source.sender().send(ControlPlaneEvent::new("id", "a")).await;

        assert_eq!(
            result,
            Err(ConnectorError::PublishFailed("error occurred".to_string()))
        );
    }

    #[tokio::test]
    async fn test_stop_returns_disconnect_error_unchanged() {
        let mut mock = MockBrokerConnector::new();
        mock.expect_disconnect()
            .times(1)
            .returning(|| Err(ConnectorError::DisconnectFailed("closed".to_string())));
        mock.expect_unsubscribe_all().never();

        let source = EventSource::new(Arc::new(mock));

        assert_eq!(
            source.stop().await,
            Err(ConnectorError::DisconnectFailed("closed".to_string()))
        );
    }

    #[tokio::test]
    async fn test_start_uses_queue_group_from_registration() {
        let mut mock = MockBrokerConnector::new();
        mock.expect_queue_subscribe_multiple()
            .withf(|subjects, queue_group, _| {
                subjects == ["a".to_string(), "b".to_string()] && queue_group == "my-service"
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let source = EventSource::new(Arc::new(mock));
        let (updates, _updates_rx) = mpsc::channel(1);
        let (errors, _errors_rx) = mpsc::unbounded_channel();
        let registration = RegistrationData::new(
            "my-service",
            vec!["a".to_string(), "b".to_string(), "a".to_string()],
        );

        source
            .start(CancellationToken::new(), registration, updates, errors)
            .await
            .unwrap();

        assert!(source.is_running().await);
        assert_eq!(source.subjects().await.as_slice(), &["a", "b"]);
    }

    #[tokio::test]
    async fn test_start_failure_spawns_no_watcher() {
        let mut mock = MockBrokerConnector::new();
        mock.expect_queue_subscribe_multiple()
            .times(1)
            .returning(|_, _, _| Err(ConnectorError::NotConnected));
        mock.expect_unsubscribe_all().never();

        let source = EventSource::new(Arc::new(mock));
        let cancel = CancellationToken::new();
        let (updates, _updates_rx) = mpsc::channel(1);
        let (errors, _errors_rx) = mpsc::unbounded_channel();

        let result = source
            .start(cancel.clone(), RegistrationData::default(), updates, errors)
            .await;

        assert_eq!(result, Err(EventSourceError::Start(ConnectorError::NotConnected)));
        assert!(!source.is_running().await);

        cancel.cancel();
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn test_second_start_is_rejected() {
        let mut mock = MockBrokerConnector::new();
        mock.expect_queue_subscribe_multiple()
            .times(1)
            .returning(|_, _, _| Ok(()));

        let source = EventSource::new(Arc::new(mock));
        let (updates, _updates_rx) = mpsc::channel(1);
        let (errors, _errors_rx) = mpsc::unbounded_channel();

        source
            .start(
                CancellationToken::new(),
                RegistrationData::default(),
                updates.clone(),
                errors.clone(),
            )
            .await
            .unwrap();

        let second = source
            .start(CancellationToken::new(), RegistrationData::default(), updates, errors)
            .await;

        assert_eq!(second, Err(EventSourceError::AlreadyStarted));
    }

    #[tokio::test]
    async fn test_update_before_start_is_ignored() {
        let mut mock = MockBrokerConnector::new();
        mock.expect_unsubscribe_all().never();
        mock.expect_queue_subscribe_multiple().never();

        let source = EventSource::new(Arc::new(mock));
        source.on_subscription_update(vec!["a".to_string()]).await;

        assert!(source.subjects().await.is_empty());
    }
}
