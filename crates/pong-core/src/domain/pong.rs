//! Pong derivation.

use super::codec::DecodedPing;

/// Content type of ping service messages.
pub const PING_CONTENT_TYPE: &str = "application/vnd.awala.ping-v1.ping";

/// Content type of pong service messages.
pub const PONG_CONTENT_TYPE: &str = "application/vnd.awala.ping-v1.pong";

/// Service message answering a ping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PongPayload {
    /// Always [`PONG_CONTENT_TYPE`].
    pub content_type: &'static str,
    /// The ping id, byte for byte.
    pub content: Vec<u8>,
}

/// Derive the pong for a ping. The id is echoed unchanged.
#[must_use]
pub fn derive_pong(ping: &DecodedPing) -> PongPayload {
    PongPayload {
        content_type: PONG_CONTENT_TYPE,
        content: ping.id.clone(),
    }
}
