//! # Pong Core - Ping/Pong Exchange Protocol
//!
//! Receives pings addressed to an Awala endpoint and answers each with a pong
//! carrying the same id back to the sender.
//!
//! ## Architecture Role
//!
//! ```text
//! [HTTP ingress] ──CloudEvent──→ [EventPongService] ──pong event──→ [Event bus]
//!
//! [Queue worker] ──parcel──→ [ParcelPongService] ──pong parcel──→ [Gateway]
//!                                   │
//!                                   ├──→ [ParcelTransport]  (decrypt / seal)
//!                                   └──→ [PrivateKeyStore]  (identity + session keys)
//! ```
//!
//! ## Layout
//!
//! - `domain`: codecs, certification paths, pong derivation, outcomes
//! - `ports`: inbound API and outbound collaborators
//! - `service`: the classification pipeline for both generations
//! - `adapters`: in-memory key store

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use adapters::MemoryKeyStore;
pub use domain::*;
pub use ports::inbound::{EventPingApi, ParcelPingApi};
pub use ports::outbound::{Clock, ParcelTransport, PongDelivery, PrivateKeyStore, SystemClock};
pub use service::{EventPongService, ParcelPongService};
