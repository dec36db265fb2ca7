//! HTTP middleware: request tracing and request timeouts.

mod timeout;
mod tracing;

pub use self::timeout::{TimeoutLayer, TimeoutService};
pub use self::tracing::{TracingLayer, TracingService, REQUEST_ID_HEADER};
