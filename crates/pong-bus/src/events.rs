//! # CloudEvents
//!
//! Defines the event envelope that flows through the bus and the filters
//! subscribers use to select events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{INCOMING_SERVICE_MESSAGE_TYPE, OUTGOING_SERVICE_MESSAGE_TYPE, SPEC_VERSION};

/// A CloudEvent carrying one service message.
///
/// `source` identifies the sender of the service message and `subject` its
/// recipient, so replying means swapping the two.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudEvent {
    /// Event identifier, unique per source.
    pub id: String,
    /// Originator of the event (the sender's id).
    pub source: String,
    /// Event type (e.g. the incoming service message type).
    #[serde(rename = "type")]
    pub event_type: String,
    /// Subject of the event (the recipient's id).
    pub subject: Option<String>,
    /// Media type of `data`.
    pub datacontenttype: Option<String>,
    /// When the event occurred.
    pub time: Option<DateTime<Utc>>,
    /// Raw payload.
    pub data: Vec<u8>,
}

impl CloudEvent {
    /// Create an event with a random id and the current time.
    #[must_use]
    pub fn new(event_type: impl Into<String>, source: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            source: source.into(),
            event_type: event_type.into(),
            subject: None,
            datacontenttype: None,
            time: Some(Utc::now()),
            data,
        }
    }

    /// Set the subject.
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Set the data content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.datacontenttype = Some(content_type.into());
        self
    }

    /// The CloudEvents spec version of this envelope.
    #[must_use]
    pub fn spec_version(&self) -> &'static str {
        SPEC_VERSION
    }

    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self.event_type.as_str() {
            INCOMING_SERVICE_MESSAGE_TYPE => EventTopic::IncomingServiceMessage,
            OUTGOING_SERVICE_MESSAGE_TYPE => EventTopic::OutgoingServiceMessage,
            _ => EventTopic::Other,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Service messages from peers, delivered by the endpoint.
    IncomingServiceMessage,
    /// Service messages to be sent to peers by the endpoint.
    OutgoingServiceMessage,
    /// Any other event type.
    Other,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self { topics }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &CloudEvent) -> bool {
        self.topics.is_empty() || self.topics.contains(&event.topic())
    }
}
