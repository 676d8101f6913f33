//! Control-plane event envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A CloudEvents-style event exchanged over the broker.
///
/// Every field is optional on the wire. The event type doubles as the subject
/// the event is published to, so connectors refuse to publish events without one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlPlaneEvent {
    /// Unique event id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Event type, also used as the publish subject
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,

    /// Producer of the event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// CloudEvents spec version
    #[serde(rename = "specversion", default, skip_serializing_if = "Option::is_none")]
    pub spec_version: Option<String>,

    /// Creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,

    /// Content type of `data`
    #[serde(rename = "contenttype", default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Event payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    /// Context id shared by all events of one workflow run
    #[serde(rename = "shkeptncontext", default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    /// Id of the triggering event
    #[serde(rename = "triggeredid", default, skip_serializing_if = "Option::is_none")]
    pub triggered_id: Option<String>,

    /// Commit the event refers to
    #[serde(rename = "gitcommitid", default, skip_serializing_if = "Option::is_none")]
    pub git_commit_id: Option<String>,

    /// Version of the control-plane event protocol
    #[serde(rename = "shkeptnspecversion", default, skip_serializing_if = "Option::is_none")]
    pub protocol_version: Option<String>,
}

impl ControlPlaneEvent {
    /// Create an event with the given id and type.
    pub fn new(id: impl Into<String>, event_type: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            event_type: Some(event_type.into()),
            ..Default::default()
        }
    }

    /// Attach a JSON payload.
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Attach the workflow context id.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// The event type, if present and non-empty.
    pub fn event_type(&self) -> Option<&str> {
        self.event_type.as_deref().filter(|t| !t.is_empty())
    }

    /// Decode an event from a JSON payload.
    pub fn from_json(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }

    /// Encode the event as JSON.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
