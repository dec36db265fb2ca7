//! Private keys held by this endpoint. Key material is opaque here; only the
//! parcel transport interprets it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Long-term identity key of one of our private addresses.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityKey {
    /// Private address the key belongs to.
    pub private_address: String,
    /// PKCS#8 DER key material.
    #[serde(with = "base64_bytes")]
    pub key_der: Vec<u8>,
    /// DER certificate issued for the key.
    #[serde(with = "base64_bytes")]
    pub certificate_der: Vec<u8>,
}

/// Ephemeral key for one session channel.
///
/// An *initial* key is not yet bound to a peer; a *subsequent* key is.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionKey {
    /// Key id announced to peers.
    #[serde(with = "base64_bytes")]
    pub key_id: Vec<u8>,
    /// PKCS#8 DER key material.
    #[serde(with = "base64_bytes")]
    pub key_der: Vec<u8>,
    /// Private address of our own endpoint that owns the key.
    pub owner_private_address: String,
    /// Peer the key is bound to, if any.
    pub peer_private_address: Option<String>,
}

impl SessionKey {
    /// Whether the key is not bound to a peer yet.
    #[must_use]
    pub fn is_initial(&self) -> bool {
        self.peer_private_address.is_none()
    }

    /// Hex form of the key id, used as a storage key.
    #[must_use]
    pub fn key_id_hex(&self) -> String {
        hex::encode(&self.key_id)
    }
}

// Keep key material out of logs.
impl fmt::Debug for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityKey")
            .field("private_address", &self.private_address)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKey")
            .field("key_id", &self.key_id_hex())
            .field("peer_private_address", &self.peer_private_address)
            .finish_non_exhaustive()
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}
