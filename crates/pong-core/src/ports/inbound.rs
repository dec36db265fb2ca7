//! Inbound ports (API) of the pong responder.

use crate::domain::{KeyStoreError, ParcelEnvelope, PingOutcome, PongError, TransportError};
use async_trait::async_trait;
use pong_bus::CloudEvent;

/// Answers pings delivered as CloudEvents.
#[async_trait]
pub trait EventPingApi: Send + Sync {
    /// Handle one incoming service message event.
    ///
    /// Peer-input problems come back as a non-dispatched [`PingOutcome`];
    /// `Err` is reserved for infrastructure failures.
    async fn handle_event(&self, event: CloudEvent) -> Result<PingOutcome, PongError>;
}

/// Answers pings delivered as parcels.
#[async_trait]
pub trait ParcelPingApi: Send + Sync {
    /// Read the cleartext envelope of a parcel.
    fn inspect_parcel(&self, parcel: &[u8]) -> Result<ParcelEnvelope, TransportError>;

    /// Whether we hold an identity key for `private_address`.
    async fn is_local_recipient(&self, private_address: &str) -> Result<bool, KeyStoreError>;

    /// Unwrap a queued ping parcel and deliver the pong to `gateway_address`.
    async fn process_ping(
        &self,
        parcel: &[u8],
        gateway_address: Option<&str>,
        job_id: &str,
    ) -> Result<PingOutcome, PongError>;
}
