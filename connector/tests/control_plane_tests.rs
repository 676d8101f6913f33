//! End-to-end tests of the control-plane loop against an in-memory broker.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cp_connector::{
    ConnectorAppError, ControlPlane, EventHandler, HandlerError, StaticSubscriptionSource,
};
use event_source::{
    BrokerConnector, CancellationToken, ConnectorError, ControlPlaneEvent, EventSender,
    EventSource, EventSourceError, Message, MessageHandler, RegistrationData,
};
use tokio::sync::mpsc;

/// Broker stub that records subscriptions and publishes, and lets tests
/// deliver messages through the installed handler.
#[derive(Default)]
struct InMemoryBroker {
    subscriptions: Mutex<Vec<(Vec<String>, String)>>,
    published: Mutex<Vec<ControlPlaneEvent>>,
    handler: Mutex<Option<MessageHandler>>,
    unsubscribes: Mutex<usize>,
    fail_subscribe: bool,
}

impl InMemoryBroker {
    fn subscriptions(&self) -> Vec<(Vec<String>, String)> {
        self.subscriptions.lock().unwrap().clone()
    }

    fn published(&self) -> Vec<ControlPlaneEvent> {
        self.published.lock().unwrap().clone()
    }

    fn unsubscribes(&self) -> usize {
        *self.unsubscribes.lock().unwrap()
    }

    async fn deliver(&self, event: &ControlPlaneEvent) {
        let handler = self.handler.lock().unwrap().clone().expect("no handler installed");
        let subject = event.event_type().unwrap_or_default().to_string();
        handler
            .process(Message::new(subject, event.to_json().unwrap()))
            .await
            .unwrap();
    }
}

#[async_trait]
impl BrokerConnector for InMemoryBroker {
    async fn subscribe(&self, subject: &str, handler: MessageHandler) -> Result<(), ConnectorError> {
        self.queue_subscribe_multiple(&[subject.to_string()], "", handler).await
    }

    async fn queue_subscribe(
        &self,
        subject: &str,
        queue_group: &str,
        handler: MessageHandler,
    ) -> Result<(), ConnectorError> {
        self.queue_subscribe_multiple(&[subject.to_string()], queue_group, handler)
            .await
    }

    async fn subscribe_multiple(
        &self,
        subjects: &[String],
        handler: MessageHandler,
    ) -> Result<(), ConnectorError> {
        self.queue_subscribe_multiple(subjects, "", handler).await
    }

    async fn queue_subscribe_multiple(
        &self,
        subjects: &[String],
        queue_group: &str,
        handler: MessageHandler,
    ) -> Result<(), ConnectorError> {
        if self.fail_subscribe {
            return Err(ConnectorError::NotConnected);
        }
        self.subscriptions
            .lock()
            .unwrap()
            .push((subjects.to_vec(), queue_group.to_string()));
        *self.handler.lock().unwrap() = Some(handler);
        Ok(())
    }

    async fn publish(&self, event: ControlPlaneEvent) -> Result<(), ConnectorError> {
        self.published.lock().unwrap().push(event);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), ConnectorError> {
        Ok(())
    }

    async fn unsubscribe_all(&self) -> Result<(), ConnectorError> {
        *self.unsubscribes.lock().unwrap() += 1;
        Ok(())
    }
}

/// Replies to every `.triggered` event with a `.finished` event and reports
/// what it saw. Fails on events whose id is "fail".
struct ReplyingHandler {
    seen: mpsc::UnboundedSender<ControlPlaneEvent>,
}

#[async_trait]
impl EventHandler for ReplyingHandler {
    async fn on_event(
        &self,
        event: ControlPlaneEvent,
        sender: EventSender,
    ) -> Result<(), HandlerError> {
        let _ = self.seen.send(event.clone());

        if event.id.as_deref() == Some("fail") {
            return Err("integration failed".into());
        }

        if let Some(event_type) = event.event_type() {
            if let Some(task) = event_type.strip_suffix(".triggered") {
                let reply = ControlPlaneEvent::new("reply", format!("{task}.finished"))
                    .with_context(event.context.clone().unwrap_or_default());
                sender.send(reply).await?;
            }
        }
        Ok(())
    }
}

struct Fixture {
    broker: Arc<InMemoryBroker>,
    control_plane: Arc<ControlPlane>,
    seen: mpsc::UnboundedReceiver<ControlPlaneEvent>,
}

fn fixture(broker: InMemoryBroker, subjects: Vec<String>) -> Fixture {
    let broker = Arc::new(broker);
    let (seen_tx, seen) = mpsc::unbounded_channel();
    let control_plane = ControlPlane::new(
        EventSource::new(broker.clone()),
        Arc::new(StaticSubscriptionSource::new(subjects)),
        Arc::new(ReplyingHandler { seen: seen_tx }),
    );
    Fixture {
        broker,
        control_plane: Arc::new(control_plane),
        seen,
    }
}

async fn wait_until(condition: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not met in time");
}

fn spawn_run(
    control_plane: Arc<ControlPlane>,
    cancel: CancellationToken,
    registration: RegistrationData,
) -> tokio::task::JoinHandle<cp_connector::Result<()>> {
    tokio::spawn(async move { control_plane.run(cancel, registration).await })
}

#[tokio::test]
async fn test_subscription_source_replaces_initial_subjects() {
    let fx = fixture(
        InMemoryBroker::default(),
        vec!["cp.event.deployment.triggered".to_string()],
    );
    let cancel = CancellationToken::new();
    let registration = RegistrationData::new("deploy-service", vec!["initial".to_string()]);

    let run = spawn_run(fx.control_plane.clone(), cancel.clone(), registration);

    let broker = fx.broker.clone();
    wait_until(move || broker.subscriptions().len() == 2).await;

    let subscriptions = fx.broker.subscriptions();
    assert_eq!(subscriptions[0], (vec!["initial".to_string()], "deploy-service".to_string()));
    assert_eq!(
        subscriptions[1],
        (
            vec!["cp.event.deployment.triggered".to_string()],
            "deploy-service".to_string()
        )
    );

    cancel.cancel();
    run.await.unwrap().unwrap();

    tokio::time::timeout(Duration::from_secs(2), fx.control_plane.source().stopped())
        .await
        .expect("teardown did not finish");
    assert_eq!(fx.broker.unsubscribes(), 2);
}

#[tokio::test]
async fn test_events_reach_handler_and_replies_are_published() {
    let mut fx = fixture(InMemoryBroker::default(), vec![]);
    let cancel = CancellationToken::new();

    let run = spawn_run(
        fx.control_plane.clone(),
        cancel.clone(),
        RegistrationData::new("deploy-service", vec!["cp.event.deployment.triggered".to_string()]),
    );
    let broker = fx.broker.clone();
    wait_until(move || !broker.subscriptions().is_empty()).await;

    let event = ControlPlaneEvent::new("1", "cp.event.deployment.triggered").with_context("ctx");
    fx.broker.deliver(&event).await;

    let seen = tokio::time::timeout(Duration::from_secs(1), fx.seen.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(seen, event);

    let broker = fx.broker.clone();
    wait_until(move || !broker.published().is_empty()).await;
    let reply = &fx.broker.published()[0];
    assert_eq!(reply.event_type(), Some("cp.event.deployment.finished"));
    assert_eq!(reply.context.as_deref(), Some("ctx"));

    cancel.cancel();
    run.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_handler_failure_does_not_stop_loop() {
    let mut fx = fixture(InMemoryBroker::default(), vec![]);
    let cancel = CancellationToken::new();

    let run = spawn_run(
        fx.control_plane.clone(),
        cancel.clone(),
        RegistrationData::new("svc", vec!["a".to_string()]),
    );
    let broker = fx.broker.clone();
    wait_until(move || !broker.subscriptions().is_empty()).await;

    fx.broker.deliver(&ControlPlaneEvent::new("fail", "a")).await;
    fx.broker.deliver(&ControlPlaneEvent::new("ok", "a")).await;

    let first = fx.seen.recv().await.unwrap();
    let second = fx.seen.recv().await.unwrap();
    assert_eq!(first.id.as_deref(), Some("fail"));
    assert_eq!(second.id.as_deref(), Some("ok"));
    assert!(!run.is_finished());

    cancel.cancel();
    run.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_start_failure_is_returned() {
    let fx = fixture(
        InMemoryBroker {
            fail_subscribe: true,
            ..Default::default()
        },
        vec![],
    );

    let result = fx
        .control_plane
        .run(CancellationToken::new(), RegistrationData::new("svc", vec![]))
        .await;

    assert!(matches!(
        result,
        Err(ConnectorAppError::EventSource(EventSourceError::Start(
            ConnectorError::NotConnected
        )))
    ));
}
