//! # Pong Gateway
//!
//! HTTP ingress of the pong responder.
//!
//! ```text
//! ┌──────────────────────────── pong-gateway ────────────────────────────┐
//! │  Tracing → Timeout → Body limit                                      │
//! │        │                                                             │
//! │        ├── events mode ──→ EventPingApi ──→ event bus / sink         │
//! │        │                                                             │
//! │        └── parcels mode ─→ screen parcel ─→ JobQueue                 │
//! │                                               │                      │
//! │                                        QueueWorker ─→ ParcelPingApi  │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use pong_gateway::{GatewayConfig, Ingress, PongGatewayService};
//!
//! let service = PongGatewayService::new(config, Ingress::Events(state))?;
//! service.start(shutdown_signal()).await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod domain;
pub mod middleware;
pub mod queue;
pub mod routes;
pub mod service;

pub use domain::{
    ApiError, ConfigError, EndpointConfig, GatewayConfig, GatewayError, HttpConfig, LimitsConfig,
    QueueConfig, ServiceMode, TimeoutConfig, VaultConfig,
};
pub use queue::{InMemoryJobQueue, JobQueue, JobReceiver, JobResult, QueueError, QueueWorker, QueuedPing};
pub use routes::events::EventsState;
pub use routes::parcels::{ParcelsState, GATEWAY_HEADER, PARCEL_CONTENT_TYPE};
pub use service::{Ingress, PongGatewayService};
