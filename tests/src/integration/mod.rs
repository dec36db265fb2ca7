//! Cross-crate flows.

pub mod event_flow;
pub mod parcel_flow;
