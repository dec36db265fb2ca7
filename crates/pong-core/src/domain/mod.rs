//! # Domain Layer
//!
//! Ping/pong protocol types and pure logic: certificates, certification
//! paths, the ping codecs, pong derivation and the parcel-side messages.

pub mod certificate;
pub mod codec;
pub mod errors;
pub mod keys;
pub mod message;
pub mod outcome;
pub mod path;
pub mod pong;

pub use certificate::{is_private_address, private_address_from_spki, Certificate, CertificateError};
pub use codec::{
    BinaryPingCodec, DecodedPing, JsonPingCodec, PingCodec, PingCredential, PingFormat,
    SerializationError, BINARY_ID_LENGTH,
};
pub use errors::{DeliveryError, KeyStoreError, PongError, TransportError};
pub use keys::{IdentityKey, SessionKey};
pub use message::{
    CredentialRef, ParcelEnvelope, PeerSessionKey, PongParcelRequest, RecipientAddress,
    ServiceMessage, UnwrappedMessage, WrappedPong, PONG_CREATION_BACKDATE_MINUTES, PONG_TTL_DAYS,
};
pub use outcome::PingOutcome;
pub use path::{CertificationPath, PathError};
pub use pong::{derive_pong, PongPayload, PING_CONTENT_TYPE, PONG_CONTENT_TYPE};
