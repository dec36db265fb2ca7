//! # Ping Envelope Codecs
//!
//! A ping carries an id chosen by its sender and the credential the pong
//! must be authorized with. Two wire forms exist:
//!
//! - [`JsonPingCodec`]: `{"id": ..., "pda_path": <base64 DER path>}`
//! - [`BinaryPingCodec`]: `id (36) || pda_length (u16 LE) || pda`
//!
//! Both decode into the same [`DecodedPing`].

mod binary;
mod json;

pub use binary::{BinaryPingCodec, BINARY_ID_LENGTH};
pub use json::JsonPingCodec;

use super::certificate::{Certificate, CertificateError};
use super::path::{CertificationPath, PathError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors encoding or decoding a ping.
#[derive(Debug, Error)]
pub enum SerializationError {
    /// Explicit JSON id was empty.
    #[error("Ping id should not be empty")]
    EmptyId,

    /// Explicit binary id was not 36 octets.
    #[error("Ping id should span {expected} octets (got {actual})", expected = BINARY_ID_LENGTH)]
    InvalidIdLength {
        /// Length of the rejected id.
        actual: usize,
    },

    /// The certificate does not fit a binary frame.
    #[error("PDA should not span more than {max} octets (got {actual})", max = u16::MAX)]
    PdaTooLarge {
        /// Length of the rejected certificate.
        actual: usize,
    },

    /// Ping could not be rendered as JSON.
    #[error("Ping could not be JSON-serialized")]
    Encode(#[source] serde_json::Error),

    /// Certification path could not be rendered as DER.
    #[error("Path could not be DER-serialized")]
    EncodePath(#[source] PathError),

    /// Input is not JSON.
    #[error("message is not JSON-serialized")]
    NotJson(#[source] serde_json::Error),

    /// `id` absent or not a string.
    #[error("id is missing or it is not a string")]
    MissingId,

    /// `pda_path` absent or not a string.
    #[error("path is absent")]
    MissingPath,

    /// `pda_path` is not valid base64.
    #[error("path is not base64-encoded")]
    PathNotBase64(#[source] base64::DecodeError),

    /// `pda_path` decodes to nothing.
    #[error("path is not base64-encoded")]
    EmptyPath,

    /// `pda_path` decodes to something other than a certification path.
    #[error("Malformed path")]
    MalformedPath(#[source] PathError),

    /// Binary frame is structurally broken.
    #[error("Invalid ping serialization: {0}")]
    InvalidFrame(String),

    /// Binary frame carries an invalid certificate.
    #[error("Invalid PDA serialization: {0}")]
    InvalidPda(#[source] CertificateError),
}

/// Credential carried by a ping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PingCredential {
    /// Certification path (JSON form).
    Path(CertificationPath),
    /// Single parcel delivery authorization (binary form).
    Pda(Certificate),
}

impl PingCredential {
    /// The certificate the pong will be authorized by.
    #[must_use]
    pub fn leaf(&self) -> &Certificate {
        match self {
            Self::Path(path) => &path.leaf,
            Self::Pda(certificate) => certificate,
        }
    }
}

/// A ping as decoded from the wire. Never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPing {
    /// Sender-chosen id, verbatim.
    pub id: Vec<u8>,
    /// Credential attached by the sender.
    pub credential: PingCredential,
}

/// Decodes ping payloads.
pub trait PingCodec: Send + Sync {
    /// Decode a serialized ping.
    fn decode(&self, serialized: &[u8]) -> Result<DecodedPing, SerializationError>;

    /// Wire form handled by this codec.
    fn format(&self) -> PingFormat;
}

/// Supported wire forms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PingFormat {
    /// JSON object with a base64 certification path.
    #[default]
    Json,
    /// Legacy binary frame with a single certificate.
    Binary,
}

impl PingFormat {
    /// Codec for this wire form.
    #[must_use]
    pub fn codec(self) -> Box<dyn PingCodec> {
        match self {
            Self::Json => Box::new(JsonPingCodec),
            Self::Binary => Box::new(BinaryPingCodec),
        }
    }
}

impl fmt::Display for PingFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

impl FromStr for PingFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "binary" => Ok(Self::Binary),
            other => Err(format!("unknown ping format '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            SerializationError::EmptyId.to_string(),
            "Ping id should not be empty"
        );
        assert_eq!(
            SerializationError::InvalidIdLength { actual: 35 }.to_string(),
            "Ping id should span 36 octets (got 35)"
        );
        assert_eq!(
            SerializationError::MissingId.to_string(),
            "id is missing or it is not a string"
        );
        assert_eq!(SerializationError::MissingPath.to_string(), "path is absent");
        assert_eq!(
            SerializationError::EmptyPath.to_string(),
            "path is not base64-encoded"
        );
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("json".parse::<PingFormat>().unwrap(), PingFormat::Json);
        assert_eq!("BINARY".parse::<PingFormat>().unwrap(), PingFormat::Binary);
        assert!("xml".parse::<PingFormat>().is_err());
        assert_eq!(PingFormat::default(), PingFormat::Json);
    }

    #[test]
    fn test_format_selects_codec() {
        assert_eq!(PingFormat::Json.codec().format(), PingFormat::Json);
        assert_eq!(PingFormat::Binary.codec().format(), PingFormat::Binary);
    }
}
