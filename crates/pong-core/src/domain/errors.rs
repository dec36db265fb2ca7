//! Errors raised by the outbound ports and by the pong services.

use pong_bus::EmitError;
use thiserror::Error;

/// Errors from the private key store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyStoreError {
    /// No such key.
    #[error("Key not found: {0}")]
    NotFound(String),

    /// The store could not be reached or failed.
    #[error("Key store unavailable: {0}")]
    Unavailable(String),

    /// The store did not answer in time.
    #[error("Key store timed out")]
    Timeout,

    /// A stored record could not be read.
    #[error("Stored key is corrupt: {0}")]
    Corrupt(String),
}

impl KeyStoreError {
    /// Whether the error is a fault of the store rather than of the lookup.
    #[must_use]
    pub fn is_infrastructure(&self) -> bool {
        !matches!(self, Self::NotFound(_))
    }
}

/// Errors from the parcel transport.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The bytes are not a parcel.
    #[error("Malformed parcel: {0}")]
    MalformedParcel(String),

    /// The parcel could not be decrypted or verified.
    #[error("Could not unwrap service message: {0}")]
    Unwrap(String),

    /// The pong could not be sealed.
    #[error("Could not wrap pong: {0}")]
    Wrap(String),

    /// A key lookup failed while unwrapping or wrapping.
    #[error(transparent)]
    KeyStore(#[from] KeyStoreError),
}

impl TransportError {
    /// Whether the error comes from our infrastructure rather than the
    /// peer's input.
    #[must_use]
    pub fn is_infrastructure(&self) -> bool {
        match self {
            Self::KeyStore(e) => e.is_infrastructure(),
            Self::Wrap(_) => true,
            Self::MalformedParcel(_) | Self::Unwrap(_) => false,
        }
    }
}

/// Errors delivering a pong parcel to a gateway.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// The gateway refused the parcel as invalid.
    #[error("Gateway refused parcel as invalid: {0}")]
    InvalidParcel(String),

    /// The gateway answered with an unexpected status.
    #[error("Gateway answered with status {status}")]
    Rejected {
        /// HTTP status.
        status: u16,
    },

    /// The gateway could not be reached.
    #[error("Gateway unreachable: {0}")]
    Network(String),

    /// The gateway did not answer in time.
    #[error("Gateway timed out")]
    Timeout,
}

/// Hard failures while handling a ping. Callers retry or answer 5xx.
#[derive(Debug, Error)]
pub enum PongError {
    /// Key store failure.
    #[error("Key store failure: {0}")]
    KeyStore(#[from] KeyStoreError),

    /// Parcel transport failure.
    #[error("Parcel transport failure: {0}")]
    Transport(#[source] TransportError),

    /// Gateway delivery failure.
    #[error("Pong delivery failed: {0}")]
    Delivery(#[from] DeliveryError),

    /// Event emission failure.
    #[error("Pong emission failed: {0}")]
    Emit(#[from] EmitError),
}

impl From<TransportError> for PongError {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::KeyStore(e) => Self::KeyStore(e),
            other => Self::Transport(other),
        }
    }
}
