//! Parcel-side messages exchanged with the parcel transport.

use super::certificate::{is_private_address, Certificate};
use super::keys::{IdentityKey, SessionKey};
use super::pong::PongPayload;
use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// Minutes a pong parcel's creation time is backdated by, to tolerate clock
/// drift at the recipient.
pub const PONG_CREATION_BACKDATE_MINUTES: i64 = 5;

/// Days a pong parcel stays valid.
pub const PONG_TTL_DAYS: i64 = 14;

/// Recipient of an inbound parcel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipientAddress {
    /// Identity-derived address of one of our endpoints.
    Private(String),
    /// Internet host name of this service.
    Public(String),
}

impl RecipientAddress {
    /// Classify a raw recipient address.
    #[must_use]
    pub fn parse(address: &str) -> Self {
        if is_private_address(address) {
            Self::Private(address.to_string())
        } else {
            Self::Public(address.to_string())
        }
    }

    /// Whether a public address names `host`, with or without an
    /// `https://` scheme and trailing slash.
    #[must_use]
    pub fn is_public_host(&self, host: &str) -> bool {
        match self {
            Self::Private(_) => false,
            Self::Public(address) => {
                let bare = address
                    .strip_prefix("https://")
                    .unwrap_or(address)
                    .trim_end_matches('/');
                bare.eq_ignore_ascii_case(host)
            }
        }
    }
}

impl fmt::Display for RecipientAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Private(address) | Self::Public(address) => f.write_str(address),
        }
    }
}

/// Cleartext parcel metadata, readable without decryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParcelEnvelope {
    /// Parcel id.
    pub id: String,
    /// Declared recipient.
    pub recipient: RecipientAddress,
}

/// Public session key a peer announced, usable as an encryption target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerSessionKey {
    /// Key id.
    pub key_id: Vec<u8>,
    /// DER `SubjectPublicKeyInfo`.
    pub public_key_der: Vec<u8>,
}

/// Key a pong is encrypted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialRef {
    /// The peer's long-term certificate.
    Certificate(Certificate),
    /// A session key announced by the peer.
    SessionKey(PeerSessionKey),
}

/// Service message found inside a decrypted parcel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceMessage {
    /// Declared content type.
    pub content_type: String,
    /// Payload.
    pub content: Vec<u8>,
}

/// Result of decrypting an inbound parcel.
#[derive(Debug, Clone)]
pub struct UnwrappedMessage {
    /// Parcel id.
    pub parcel_id: String,
    /// Sender's certificate.
    pub sender: Certificate,
    /// Our private address the parcel was sent to.
    pub recipient_private_address: String,
    /// Decrypted service message.
    pub message: ServiceMessage,
    /// Key the reply must be encrypted to.
    pub reply_key: CredentialRef,
}

/// Everything the transport needs to seal a pong parcel.
#[derive(Debug, Clone)]
pub struct PongParcelRequest {
    /// Ping sender, recipient of the pong.
    pub recipient: Certificate,
    /// Credential authorizing the pong (the ping's PDA).
    pub authorization: Certificate,
    /// Our identity key signing the parcel.
    pub signer: IdentityKey,
    /// Encryption target.
    pub encrypt_to: CredentialRef,
    /// Parcel creation time.
    pub creation: DateTime<Utc>,
    /// Parcel expiry time.
    pub expiry: DateTime<Utc>,
    /// The pong.
    pub payload: PongPayload,
}

impl PongParcelRequest {
    /// Build a request timed relative to `now`.
    #[must_use]
    pub fn new(
        unwrapped: &UnwrappedMessage,
        authorization: Certificate,
        signer: IdentityKey,
        payload: PongPayload,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            recipient: unwrapped.sender.clone(),
            authorization,
            signer,
            encrypt_to: unwrapped.reply_key.clone(),
            creation: now - Duration::minutes(PONG_CREATION_BACKDATE_MINUTES),
            expiry: now + Duration::days(PONG_TTL_DAYS),
            payload,
        }
    }
}

/// A sealed pong parcel.
#[derive(Debug, Clone)]
pub struct WrappedPong {
    /// Serialized parcel.
    pub parcel: Vec<u8>,
    /// Session key generated for the reply, to be stored once delivered.
    pub new_session_key: Option<SessionKey>,
}
