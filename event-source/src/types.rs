//! Core types for the event-source crate.

use bytes::Bytes;

use crate::event::ControlPlaneEvent;

/// A raw message as delivered by the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Subject the message was delivered on
    pub subject: String,
    /// Undecoded payload
    pub payload: Bytes,
}

impl Message {
    /// Create a new message.
    pub fn new(subject: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            subject: subject.into(),
            payload: payload.into(),
        }
    }
}

/// Identity and initial subjects of a consumer.
///
/// Supplied once to [`EventSource::start`](crate::EventSource::start) and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationData {
    /// Logical consumer name, shared by all replicas of that consumer
    pub name: String,
    /// Subjects to subscribe to on start
    pub subjects: Vec<String>,
}

impl RegistrationData {
    /// Create registration data for a consumer.
    pub fn new(name: impl Into<String>, subjects: Vec<String>) -> Self {
        Self {
            name: name.into(),
            subjects,
        }
    }

    /// Queue group shared by every replica registered under this name.
    pub fn queue_group(&self) -> QueueGroup {
        QueueGroup::from_name(&self.name)
    }
}

/// Name of the queue group used for every queue subscription.
///
/// Derived only from the registration name, so replicas started independently
/// end up in the same group.
#[derive(Debug, Clone, Default, Hash, Eq, PartialEq)]
pub struct QueueGroup(String);

impl QueueGroup {
    /// Derive the queue group for a consumer name.
    pub fn from_name(name: &str) -> Self {
        Self(name.trim().to_string())
    }

    /// Get the queue group as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for QueueGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Delivery metadata attached to an [`EventUpdate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventUpdateMetadata {
    /// Subject the event was delivered on, taken from the broker envelope
    pub subject: String,
}

/// A decoded event together with its delivery metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct EventUpdate {
    /// The decoded event
    pub event: ControlPlaneEvent,
    /// Delivery metadata
    pub metadata: EventUpdateMetadata,
}

impl EventUpdate {
    /// Create an update for an event delivered on `subject`.
    pub fn new(event: ControlPlaneEvent, subject: impl Into<String>) -> Self {
        Self {
            event,
            metadata: EventUpdateMetadata {
                subject: subject.into(),
            },
        }
    }

    /// The subject the event was delivered on.
    pub fn subject(&self) -> &str {
        &self.metadata.subject
    }
}
