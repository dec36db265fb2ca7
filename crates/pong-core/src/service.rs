//! # Pong Services
//!
//! Glue between the inbound message, the ping codec, pong derivation and
//! reply dispatch. Each ping goes through the same stages, stopping at the
//! first failure:
//!
//! 1. Unwrap the inbound message (CloudEvent checks or parcel decryption)
//! 2. Check the content type is the ping type
//! 3. Decode the ping
//! 4. Derive the pong
//! 5. Wrap and dispatch the pong
//!
//! Failures in stages 1–3 and a gateway refusing the pong parcel are logged
//! at `info` and reported as a [`PingOutcome`]. Infrastructure failures are
//! returned as [`PongError`] for the caller to retry or surface as 5xx.
//! Nothing is persisted before dispatch succeeds.

use std::sync::Arc;

use async_trait::async_trait;
use pong_bus::{CloudEvent, EventPublisher, INCOMING_SERVICE_MESSAGE_TYPE, OUTGOING_SERVICE_MESSAGE_TYPE};
use tracing::{debug, error, info};

use crate::domain::{
    derive_pong, DecodedPing, DeliveryError, KeyStoreError, ParcelEnvelope, PingCodec,
    PingOutcome, PongError, PongParcelRequest, TransportError, PING_CONTENT_TYPE,
};
use crate::ports::inbound::{EventPingApi, ParcelPingApi};
use crate::ports::outbound::{Clock, ParcelTransport, PongDelivery, PrivateKeyStore};

fn check_ping_content_type(content_type: &str) -> Result<(), PingOutcome> {
    if content_type == PING_CONTENT_TYPE {
        Ok(())
    } else {
        Err(PingOutcome::InvalidServiceMessageType {
            content_type: content_type.to_string(),
        })
    }
}

fn decode_ping(codec: &dyn PingCodec, content: &[u8]) -> Result<DecodedPing, PingOutcome> {
    codec.decode(content).map_err(|e| PingOutcome::InvalidPing {
        reason: e.to_string(),
    })
}

fn log_soft_outcome(outcome: &PingOutcome, message_id: &str) {
    match outcome {
        PingOutcome::InvalidServiceMessage { reason } => {
            info!(message_id, reason = %reason, "Invalid service message");
        }
        PingOutcome::InvalidServiceMessageType { content_type } => {
            info!(message_id, content_type = %content_type, "Invalid service message type");
        }
        PingOutcome::InvalidPing { reason } => {
            info!(message_id, reason = %reason, "Invalid ping message");
        }
        PingOutcome::WrongRecipient { recipient } => {
            info!(message_id, recipient = %recipient, "Ignoring message for another recipient");
        }
        PingOutcome::DeliveryRefused {
            destination,
            reason,
        } => {
            info!(
                message_id,
                destination = %destination,
                reason = %reason,
                "Discarding pong delivery because server refused parcel"
            );
        }
        PingOutcome::NoDestination => {
            info!(message_id, "Discarding pong because no gateway address was given");
        }
        PingOutcome::Dispatched { destination } => {
            info!(message_id, destination = %destination, "Sent pong");
        }
    }
}

// =============================================================================
// Event generation
// =============================================================================

/// Answers pings arriving as CloudEvents by emitting pong events.
pub struct EventPongService {
    endpoint_id: String,
    codec: Box<dyn PingCodec>,
    publisher: Arc<dyn EventPublisher>,
}

impl EventPongService {
    /// Create a service answering on behalf of `endpoint_id`.
    pub fn new(
        endpoint_id: impl Into<String>,
        codec: Box<dyn PingCodec>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            endpoint_id: endpoint_id.into(),
            codec,
            publisher,
        }
    }

    /// Our endpoint id.
    #[must_use]
    pub fn endpoint_id(&self) -> &str {
        &self.endpoint_id
    }

    fn unwrap_event<'a>(&self, event: &'a CloudEvent) -> Result<&'a str, PingOutcome> {
        if event.event_type != INCOMING_SERVICE_MESSAGE_TYPE {
            return Err(PingOutcome::InvalidServiceMessage {
                reason: format!("unexpected event type {}", event.event_type),
            });
        }

        let subject = event
            .subject
            .as_deref()
            .ok_or_else(|| PingOutcome::InvalidServiceMessage {
                reason: "event has no subject".to_string(),
            })?;
        if subject != self.endpoint_id {
            return Err(PingOutcome::WrongRecipient {
                recipient: subject.to_string(),
            });
        }
        Ok(subject)
    }

    fn pong_event(incoming: &CloudEvent, endpoint_id: &str, ping: &DecodedPing) -> CloudEvent {
        let pong = derive_pong(ping);
        CloudEvent::new(OUTGOING_SERVICE_MESSAGE_TYPE, endpoint_id, pong.content)
            .with_subject(incoming.source.clone())
            .with_content_type(pong.content_type)
    }

    async fn answer(&self, event: &CloudEvent) -> Result<PingOutcome, PongError> {
        let endpoint_id = match self.unwrap_event(event) {
            Ok(id) => id,
            Err(outcome) => return Ok(outcome),
        };

        let content_type = event.datacontenttype.as_deref().unwrap_or_default();
        if let Err(outcome) = check_ping_content_type(content_type) {
            return Ok(outcome);
        }

        let ping = match decode_ping(self.codec.as_ref(), &event.data) {
            Ok(ping) => ping,
            Err(outcome) => return Ok(outcome),
        };

        // Reply from the subject to the source
        let pong = Self::pong_event(event, endpoint_id, &ping);
        debug!(event_id = %event.id, pong_id = %pong.id, "Emitting pong event");
        self.publisher.publish(pong).await?;

        Ok(PingOutcome::Dispatched {
            destination: event.source.clone(),
        })
    }
}

#[async_trait]
impl EventPingApi for EventPongService {
    async fn handle_event(&self, event: CloudEvent) -> Result<PingOutcome, PongError> {
        match self.answer(&event).await {
            Ok(outcome) => {
                log_soft_outcome(&outcome, &event.id);
                Ok(outcome)
            }
            Err(e) => {
                error!(message_id = %event.id, error = %e, "Failed to emit pong");
                Err(e)
            }
        }
    }
}

// =============================================================================
// Parcel generation
// =============================================================================

/// Answers pings arriving as parcels by delivering pong parcels to gateways.
pub struct ParcelPongService {
    codec: Box<dyn PingCodec>,
    transport: Arc<dyn ParcelTransport>,
    key_store: Arc<dyn PrivateKeyStore>,
    delivery: Arc<dyn PongDelivery>,
    clock: Arc<dyn Clock>,
}

impl ParcelPongService {
    /// Create the service from its collaborators.
    pub fn new(
        codec: Box<dyn PingCodec>,
        transport: Arc<dyn ParcelTransport>,
        key_store: Arc<dyn PrivateKeyStore>,
        delivery: Arc<dyn PongDelivery>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            codec,
            transport,
            key_store,
            delivery,
            clock,
        }
    }

    async fn answer(
        &self,
        parcel: &[u8],
        gateway_address: Option<&str>,
    ) -> Result<PingOutcome, PongError> {
        let unwrapped = match self
            .transport
            .unwrap_service_message(parcel, self.key_store.as_ref())
            .await
        {
            Ok(unwrapped) => unwrapped,
            Err(e) if e.is_infrastructure() => return Err(e.into()),
            Err(e) => {
                return Ok(PingOutcome::InvalidServiceMessage {
                    reason: e.to_string(),
                })
            }
        };

        if let Err(outcome) = check_ping_content_type(&unwrapped.message.content_type) {
            return Ok(outcome);
        }

        let ping = match decode_ping(self.codec.as_ref(), &unwrapped.message.content) {
            Ok(ping) => ping,
            Err(outcome) => return Ok(outcome),
        };

        let payload = derive_pong(&ping);

        let Some(gateway_address) = gateway_address else {
            return Ok(PingOutcome::NoDestination);
        };

        let signer = self.key_store.current_identity_key().await?;
        let request = PongParcelRequest::new(
            &unwrapped,
            ping.credential.leaf().clone(),
            signer,
            payload,
            self.clock.now(),
        );
        let wrapped = self
            .transport
            .wrap_pong(request)
            .await
            .map_err(PongError::from)?;

        match self.delivery.deliver(gateway_address, &wrapped.parcel).await {
            Ok(()) => {}
            Err(DeliveryError::InvalidParcel(reason)) => {
                return Ok(PingOutcome::DeliveryRefused {
                    destination: gateway_address.to_string(),
                    reason,
                })
            }
            Err(e) => return Err(e.into()),
        }

        if let Some(session_key) = wrapped.new_session_key {
            self.key_store.save_session_key(session_key).await?;
        }

        Ok(PingOutcome::Dispatched {
            destination: gateway_address.to_string(),
        })
    }
}

#[async_trait]
impl ParcelPingApi for ParcelPongService {
    fn inspect_parcel(&self, parcel: &[u8]) -> Result<ParcelEnvelope, TransportError> {
        self.transport.parse_parcel(parcel)
    }

    async fn is_local_recipient(&self, private_address: &str) -> Result<bool, KeyStoreError> {
        match self.key_store.fetch_identity_key(private_address).await {
            Ok(_) => Ok(true),
            Err(KeyStoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn process_ping(
        &self,
        parcel: &[u8],
        gateway_address: Option<&str>,
        job_id: &str,
    ) -> Result<PingOutcome, PongError> {
        match self.answer(parcel, gateway_address).await {
            Ok(outcome) => {
                log_soft_outcome(&outcome, job_id);
                Ok(outcome)
            }
            Err(e) => {
                error!(message_id = job_id, error = %e, "Failed to process ping");
                Err(e)
            }
        }
    }
}
