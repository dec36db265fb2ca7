//! # Awala Pong Runtime
//!
//! Wires the pong responder together and runs it.
//!
//! ## Startup Sequence
//!
//! 1. Parse CLI flags and initialize logging
//! 2. Load configuration from the environment (flags take precedence)
//! 3. Build the ports for the configured generation ([`PongContainer`])
//! 4. Serve HTTP, plus the ping queue worker in parcel mode
//! 5. On Ctrl-C, stop accepting requests, then stop the worker
//!
//! ## Modules
//!
//! - `config` - environment configuration
//! - `container` - port construction and lifecycle
//! - `adapters` - Vault, PoHTTP and CloudEvent sink clients

pub mod adapters;
pub mod config;
pub mod container;

pub use config::{load_config, load_config_from};
pub use container::{ContainerBuilder, ContainerError, PongContainer};
