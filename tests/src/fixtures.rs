//! # Test Fixtures
//!
//! Ping payloads in both wire forms and identity keys for the in-memory key
//! store, built on the certificate fixtures of `pong_core::test_utils`.

pub use pong_core::test_utils::certificate;
use pong_core::{
    BinaryPingCodec, Certificate, CertificationPath, IdentityKey, JsonPingCodec,
};

/// Endpoint id used by event-mode fixtures.
pub const ENDPOINT_ID: &str = "0pong-endpoint";

/// Peer that sends pings in event-mode fixtures.
pub const PEER_ID: &str = "0ping-sender";

/// JSON ping carrying `id` and a two-certificate path.
pub fn json_ping(id: &str) -> Vec<u8> {
    let path = CertificationPath::new(certificate("pda"), vec![certificate("ping sender")]);
    JsonPingCodec.encode(&path, Some(id)).expect("json ping")
}

/// Binary ping carrying a 36-byte `id`.
pub fn binary_ping(id: &[u8]) -> Vec<u8> {
    BinaryPingCodec
        .encode(&certificate("pda"), Some(id))
        .expect("binary ping")
}

/// Identity key for `certificate`, as our endpoint would hold it.
pub fn identity_key(certificate: &Certificate) -> IdentityKey {
    IdentityKey {
        private_address: certificate.private_address().to_string(),
        key_der: vec![0x30, 0x00],
        certificate_der: certificate.as_der().to_vec(),
    }
}
