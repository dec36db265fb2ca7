//! Outcome of handling one ping.

use std::fmt;

/// What happened to a ping that did not hit an infrastructure failure.
///
/// Everything except [`PingOutcome::Dispatched`] is a peer-input problem:
/// logged and swallowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PingOutcome {
    /// The pong left.
    Dispatched {
        /// Where it went.
        destination: String,
    },
    /// The inbound message could not be unwrapped.
    InvalidServiceMessage {
        /// Why.
        reason: String,
    },
    /// The service message is not a ping.
    InvalidServiceMessageType {
        /// Offending content type.
        content_type: String,
    },
    /// The ping payload could not be decoded.
    InvalidPing {
        /// Why.
        reason: String,
    },
    /// The message is addressed to someone else.
    WrongRecipient {
        /// Declared recipient.
        recipient: String,
    },
    /// The gateway refused the pong parcel as invalid.
    DeliveryRefused {
        /// Gateway that refused it.
        destination: String,
        /// Refusal reason.
        reason: String,
    },
    /// The job carries no gateway to deliver the pong to.
    NoDestination,
}

impl PingOutcome {
    /// Whether the pong was dispatched.
    #[must_use]
    pub fn is_dispatched(&self) -> bool {
        matches!(self, Self::Dispatched { .. })
    }
}

impl fmt::Display for PingOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dispatched { destination } => write!(f, "Sent pong to {destination}"),
            Self::InvalidServiceMessage { reason } => {
                write!(f, "Invalid service message: {reason}")
            }
            Self::InvalidServiceMessageType { content_type } => {
                write!(f, "Invalid service message type: {content_type}")
            }
            Self::InvalidPing { reason } => write!(f, "Invalid ping message: {reason}"),
            Self::WrongRecipient { recipient } => {
                write!(f, "Message is not addressed to this endpoint: {recipient}")
            }
            Self::DeliveryRefused { destination, .. } => write!(
                f,
                "Discarding pong delivery because server refused parcel ({destination})"
            ),
            Self::NoDestination => write!(f, "No gateway address to deliver the pong to"),
        }
    }
}
