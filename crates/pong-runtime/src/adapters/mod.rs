//! Adapters for the outbound ports: Vault key store, PoHTTP delivery and the
//! HTTP CloudEvent sink.

pub mod event_sink;
pub mod pohttp;
pub mod vault;

pub use event_sink::HttpEventSink;
pub use pohttp::PoHttpDelivery;
pub use vault::VaultKeyStore;
