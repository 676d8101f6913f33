//! Bookkeeping for active subscriptions.
//!
//! Every subscription is served by a delivery task. The registry keeps, per
//! subject, the token that stops the task and the handle that reports how the
//! unsubscribe went.

use std::collections::HashMap;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{NatsError, Result};

/// Outcome of a delivery task: `Err` carries the unsubscribe failure.
pub(crate) type DeliveryResult = std::result::Result<(), String>;

/// A running delivery task for one subject.
#[derive(Debug)]
pub(crate) struct ActiveSubscription {
    cancel: CancellationToken,
    task: JoinHandle<DeliveryResult>,
}

impl ActiveSubscription {
    pub(crate) fn new(cancel: CancellationToken, task: JoinHandle<DeliveryResult>) -> Self {
        Self { cancel, task }
    }

    /// Stop delivery and wait for the task to unsubscribe.
    async fn close(self) -> DeliveryResult {
        self.cancel.cancel();
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(format!("delivery task failed: {e}")),
        }
    }
}

/// Active subscriptions keyed by subject.
#[derive(Debug, Default)]
pub(crate) struct SubscriptionRegistry {
    subscriptions: HashMap<String, ActiveSubscription>,
}

impl SubscriptionRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Fail unless `subject` may be subscribed.
    pub(crate) fn check_available(&self, subject: &str) -> Result<()> {
        if subject.is_empty() {
            return Err(NatsError::EmptySubject);
        }
        if self.subscriptions.contains_key(subject) {
            return Err(NatsError::AlreadySubscribed(subject.to_string()));
        }
        Ok(())
    }

    pub(crate) fn insert(&mut self, subject: String, subscription: ActiveSubscription) {
        self.subscriptions.insert(subject, subscription);
    }

    pub(crate) fn subjects(&self) -> Vec<String> {
        let mut subjects: Vec<String> = self.subscriptions.keys().cloned().collect();
        subjects.sort();
        subjects
    }

    pub(crate) fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Close every subscription and empty the registry.
    ///
    /// All subscriptions are attempted even if some fail; the error names
    /// every subject whose unsubscribe failed.
    pub(crate) async fn close_all(&mut self) -> Result<()> {
        let all: Vec<(String, ActiveSubscription)> = self.subscriptions.drain().collect();
        close_each(all).await
    }

    /// Close and remove only `subjects`; unknown subjects are skipped.
    pub(crate) async fn close_subjects(&mut self, subjects: &[String]) -> Result<()> {
        let selected: Vec<(String, ActiveSubscription)> = subjects
            .iter()
            .filter_map(|subject| self.subscriptions.remove_entry(subject))
            .collect();
        close_each(selected).await
    }

    /// Stop every delivery task without unsubscribing and empty the registry.
    ///
    /// For use once the connection itself is gone.
    pub(crate) fn abandon_all(&mut self) -> usize {
        let count = self.subscriptions.len();
        for (_, subscription) in self.subscriptions.drain() {
            subscription.cancel.cancel();
        }
        count
    }
}

async fn close_each(subscriptions: Vec<(String, ActiveSubscription)>) -> Result<()> {
    let mut failed = Vec::new();

    for (subject, subscription) in subscriptions {
        match subscription.close().await {
            Ok(()) => debug!(subject = %subject, "Unsubscribed"),
            Err(reason) => {
                warn!(subject = %subject, reason = %reason, "Could not unsubscribe");
                failed.push(subject);
            }
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        failed.sort();
        Err(NatsError::Unsubscribe { subjects: failed })
    }
}
