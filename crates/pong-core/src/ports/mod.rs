//! Ports: the API the pong services offer and the collaborators they need.

pub mod inbound;
pub mod outbound;
