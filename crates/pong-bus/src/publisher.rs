//! # Event Publisher
//!
//! Defines the emitting side of the bus: the [`EventPublisher`] port used by
//! the pong service and the in-process broadcast implementation.

use crate::events::{CloudEvent, EventFilter};
use crate::subscriber::{EventSubscriber, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Errors raised while emitting an event.
///
/// Every variant is an infrastructure failure: callers must propagate it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EmitError {
    /// The event could not be handed to the transport.
    #[error("Event transport failed: {0}")]
    Transport(String),

    /// The sink answered with a non-success status.
    #[error("Event sink refused the event with status {status}")]
    Refused {
        /// HTTP status returned by the sink.
        status: u16,
    },

    /// The sink did not answer in time.
    #[error("Event sink timed out")]
    Timeout,
}

/// Trait for emitting events onto the bus.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Emit an event.
    ///
    /// # Returns
    ///
    /// The number of consumers that received the event, when the transport
    /// can tell. An event no consumer can receive is an error.
    async fn publish(&self, event: CloudEvent) -> Result<usize, EmitError>;

    /// Get the total number of events emitted.
    fn events_published(&self) -> u64;
}

/// In-memory implementation of the event bus.
///
/// Uses `tokio::sync::broadcast` for multi-producer, multi-consumer semantics.
pub struct InMemoryEventBus {
    sender: broadcast::Sender<CloudEvent>,
    events_published: AtomicU64,
    capacity: usize,
}

impl InMemoryEventBus {
    /// Create a new in-memory event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new in-memory event bus with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            events_published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Get the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Get the channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSubscriber for InMemoryEventBus {
    fn subscribe(&self, filter: EventFilter) -> Subscription {
        debug!(topics = ?filter.topics, "New subscription created");
        Subscription::new(self.sender.subscribe(), filter)
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: CloudEvent) -> Result<usize, EmitError> {
        let topic = event.topic();
        let event_id = event.id.clone();

        match self.sender.send(event) {
            Ok(receivers) => {
                self.events_published.fetch_add(1, Ordering::Relaxed);
                debug!(topic = ?topic, event_id = %event_id, receivers, "Event published");
                Ok(receivers)
            }
            Err(_) => {
                warn!(topic = ?topic, event_id = %event_id, "Event dropped (no receivers)");
                Err(EmitError::Transport(
                    "no subscriber on the in-process event bus".to_string(),
                ))
            }
        }
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}
