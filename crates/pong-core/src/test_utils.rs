//! Test doubles for the outbound ports.
//!
//! Enable with the `test-utils` feature flag.
//!
//! [`StubParcelTransport`] does no cryptography: its parcels are JSON
//! documents ([`StubParcel`]), which lets tests build pings and inspect
//! pongs without a real transport. Certificates are real, self-signed and
//! generated with `rcgen`.

use crate::domain::{
    Certificate, CredentialRef, DeliveryError, ParcelEnvelope, PeerSessionKey,
    PongParcelRequest, RecipientAddress, ServiceMessage, SessionKey, TransportError,
    UnwrappedMessage, WrappedPong,
};
use crate::ports::outbound::{Clock, ParcelTransport, PongDelivery, PrivateKeyStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use uuid::Uuid;

/// Generate a self-signed DER certificate for `common_name`.
#[allow(clippy::expect_used)]
#[must_use]
pub fn generate_certificate(common_name: &str) -> Vec<u8> {
    let key = KeyPair::generate().expect("key pair");
    let mut params = CertificateParams::default();
    let mut name = DistinguishedName::new();
    name.push(DnType::CommonName, common_name);
    params.distinguished_name = name;
    params
        .self_signed(&key)
        .expect("self-signed certificate")
        .der()
        .to_vec()
}

/// Generate and parse a self-signed certificate for `common_name`.
#[allow(clippy::expect_used)]
#[must_use]
pub fn certificate(common_name: &str) -> Certificate {
    Certificate::from_der(&generate_certificate(common_name)).expect("parseable certificate")
}

/// A clock stuck at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Utc>,
}

impl FixedClock {
    /// Create a clock returning `now`.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

/// Delivery double that records every parcel it is given.
pub struct RecordingDelivery {
    deliveries: Mutex<Vec<(String, Vec<u8>)>>,
    failure: Option<DeliveryError>,
}

impl RecordingDelivery {
    /// A delivery that always succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self {
            deliveries: Mutex::new(Vec::new()),
            failure: None,
        }
    }

    /// A delivery that always fails with `error`.
    #[must_use]
    pub fn failing(error: DeliveryError) -> Self {
        Self {
            deliveries: Mutex::new(Vec::new()),
            failure: Some(error),
        }
    }

    /// `(gateway address, parcel)` pairs delivered so far.
    #[must_use]
    pub fn deliveries(&self) -> Vec<(String, Vec<u8>)> {
        self.deliveries
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }
}

impl Default for RecordingDelivery {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PongDelivery for RecordingDelivery {
    async fn deliver(&self, gateway_address: &str, parcel: &[u8]) -> Result<(), DeliveryError> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        if let Ok(mut deliveries) = self.deliveries.lock() {
            deliveries.push((gateway_address.to_string(), parcel.to_vec()));
        }
        Ok(())
    }
}

/// Cleartext stand-in for a parcel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StubParcel {
    /// Parcel id.
    pub id: String,
    /// Recipient address.
    pub recipient: String,
    /// Sender certificate, DER.
    pub sender_certificate: Vec<u8>,
    /// Service message content type.
    pub content_type: String,
    /// Service message content.
    pub content: Vec<u8>,
    /// Session key announced by the sender, if any.
    pub session_key_id: Option<Vec<u8>>,
}

impl StubParcel {
    /// Create a parcel from `sender` to `recipient`.
    #[must_use]
    pub fn new(
        recipient: &str,
        sender: &Certificate,
        content_type: &str,
        content: Vec<u8>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            recipient: recipient.to_string(),
            sender_certificate: sender.as_der().to_vec(),
            content_type: content_type.to_string(),
            content,
            session_key_id: None,
        }
    }

    /// Announce a session key for the reply.
    #[must_use]
    pub fn with_session_key(mut self, key_id: Vec<u8>) -> Self {
        self.session_key_id = Some(key_id);
        self
    }

    /// Serialize.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Deserialize.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TransportError> {
        serde_json::from_slice(bytes).map_err(|e| TransportError::MalformedParcel(e.to_string()))
    }
}

/// Parcel transport double working on [`StubParcel`]s.
///
/// Unwrapping requires an identity key for the recipient, as decryption would.
/// Every pong request it seals is recorded.
#[derive(Debug, Default)]
pub struct StubParcelTransport {
    requests: Mutex<Vec<PongParcelRequest>>,
}

impl StubParcelTransport {
    /// Create the transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pong requests sealed so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<PongParcelRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ParcelTransport for StubParcelTransport {
    fn parse_parcel(&self, parcel: &[u8]) -> Result<ParcelEnvelope, TransportError> {
        let parcel = StubParcel::from_bytes(parcel)?;
        Ok(ParcelEnvelope {
            recipient: RecipientAddress::parse(&parcel.recipient),
            id: parcel.id,
        })
    }

    async fn unwrap_service_message(
        &self,
        parcel: &[u8],
        keys: &dyn PrivateKeyStore,
    ) -> Result<UnwrappedMessage, TransportError> {
        let parcel = StubParcel::from_bytes(parcel)?;
        keys.fetch_identity_key(&parcel.recipient).await?;

        let sender = Certificate::from_der(&parcel.sender_certificate)
            .map_err(|e| TransportError::Unwrap(e.to_string()))?;
        let reply_key = match parcel.session_key_id {
            Some(key_id) => CredentialRef::SessionKey(PeerSessionKey {
                key_id,
                public_key_der: Vec::new(),
            }),
            None => CredentialRef::Certificate(sender.clone()),
        };

        Ok(UnwrappedMessage {
            parcel_id: parcel.id,
            sender,
            recipient_private_address: parcel.recipient,
            message: ServiceMessage {
                content_type: parcel.content_type,
                content: parcel.content,
            },
            reply_key,
        })
    }

    async fn wrap_pong(&self, request: PongParcelRequest) -> Result<WrappedPong, TransportError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        let recipient = request.recipient.private_address().to_string();
        let new_session_key = match &request.encrypt_to {
            CredentialRef::SessionKey(_) => Some(SessionKey {
                key_id: Uuid::new_v4().as_bytes().to_vec(),
                key_der: Vec::new(),
                owner_private_address: request.signer.private_address.clone(),
                peer_private_address: Some(recipient.clone()),
            }),
            CredentialRef::Certificate(_) => None,
        };

        let parcel = StubParcel {
            id: Uuid::new_v4().to_string(),
            recipient,
            sender_certificate: request.signer.certificate_der,
            content_type: request.payload.content_type.to_string(),
            content: request.payload.content,
            session_key_id: None,
        };
        Ok(WrappedPong {
            parcel: parcel.to_bytes(),
            new_session_key,
        })
    }
}
