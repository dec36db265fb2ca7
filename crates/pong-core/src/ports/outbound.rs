//! Outbound ports (SPI) of the pong responder.

use crate::domain::{
    DeliveryError, IdentityKey, KeyStoreError, ParcelEnvelope, PongParcelRequest, SessionKey,
    TransportError, UnwrappedMessage, WrappedPong,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Parcel cryptography: parsing, decryption and sealing.
#[async_trait]
pub trait ParcelTransport: Send + Sync {
    /// Parse the cleartext envelope without decrypting.
    fn parse_parcel(&self, parcel: &[u8]) -> Result<ParcelEnvelope, TransportError>;

    /// Verify and decrypt a parcel, looking up our keys in `keys`.
    async fn unwrap_service_message(
        &self,
        parcel: &[u8],
        keys: &dyn PrivateKeyStore,
    ) -> Result<UnwrappedMessage, TransportError>;

    /// Seal a pong into a parcel.
    async fn wrap_pong(&self, request: PongParcelRequest) -> Result<WrappedPong, TransportError>;
}

/// Storage for our identity and session keys.
#[async_trait]
pub trait PrivateKeyStore: Send + Sync {
    /// Identity key for one of our private addresses.
    async fn fetch_identity_key(&self, private_address: &str)
        -> Result<IdentityKey, KeyStoreError>;

    /// Identity key currently used to sign outgoing parcels.
    async fn current_identity_key(&self) -> Result<IdentityKey, KeyStoreError>;

    /// Session key by id, checked against the peer it is bound to.
    async fn fetch_session_key(
        &self,
        key_id: &[u8],
        peer_private_address: &str,
    ) -> Result<SessionKey, KeyStoreError>;

    /// Store a session key.
    async fn save_session_key(&self, key: SessionKey) -> Result<(), KeyStoreError>;
}

/// Delivers sealed pong parcels to a gateway.
#[async_trait]
pub trait PongDelivery: Send + Sync {
    /// Deliver `parcel` to the gateway at `gateway_address`.
    async fn deliver(&self, gateway_address: &str, parcel: &[u8]) -> Result<(), DeliveryError>;
}

/// Clock for testability.
pub trait Clock: Send + Sync {
    /// Current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
