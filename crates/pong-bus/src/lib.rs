//! # Pong Bus - CloudEvents Bus for Service Messages
//!
//! Carries the service messages exchanged between the pong responder and the
//! Awala Internet endpoint as CloudEvents.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │   Endpoint   │  incoming-service  │     Pong     │
//! │   (Awala)    │ ─────message─────→ │  responder   │
//! │              │ ←────outgoing───── │              │
//! └──────────────┘  service-message   └──────────────┘
//! ```
//!
//! ## Contents
//!
//! - `events`: the [`CloudEvent`] envelope and topic filtering
//! - `publisher`: the [`EventPublisher`] port and the in-memory bus
//! - `subscriber`: subscriptions to the in-memory bus
//! - `http_binding`: the CloudEvents HTTP binary content mode

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod http_binding;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{CloudEvent, EventFilter, EventTopic};
pub use http_binding::{decode_binary, encode_binary, BindingError};
pub use publisher::{EmitError, EventPublisher, InMemoryEventBus};
pub use subscriber::{EventSubscriber, Subscription, SubscriptionError};

/// CloudEvents specification version produced and accepted by this crate.
pub const SPEC_VERSION: &str = "1.0";

/// Maximum events to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// Event type of service messages delivered by the endpoint to this service.
pub const INCOMING_SERVICE_MESSAGE_TYPE: &str =
    "tech.relaycorp.awala.endpoint-internet.incoming-service-message";

/// Event type of service messages this service asks the endpoint to send.
pub const OUTGOING_SERVICE_MESSAGE_TYPE: &str =
    "tech.relaycorp.awala.endpoint-internet.outgoing-service-message";
