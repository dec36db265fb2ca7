//! # Awala Pong Test Suite
//!
//! End-to-end flows across the workspace crates.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Certificates, pings, keys
//! └── integration/
//!     ├── event_flow.rs   # CloudEvent ingress → pong on the bus
//!     └── parcel_flow.rs  # Parcel ingress → queue → worker → gateway
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p pong-tests
//! cargo test -p pong-tests integration::parcel_flow
//! ```

#![allow(dead_code)]

pub mod fixtures;
pub mod integration;
