//! # Ping Queue
//!
//! Parcel pings are acknowledged as soon as they are queued. A worker
//! processes them afterwards and retries infrastructure failures.

mod memory;
mod worker;

pub use memory::{InMemoryJobQueue, JobReceiver};
pub use worker::{JobResult, QueueWorker};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A ping waiting to be answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedPing {
    /// The ping parcel, base64-encoded.
    pub parcel: String,
    /// Gateway to deliver the pong to, from `X-Awala-Gateway`.
    #[serde(
        rename = "gatewayAddress",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub gateway_address: Option<String>,
}

/// A queued ping with its delivery bookkeeping.
#[derive(Debug, Clone)]
pub struct QueueJob {
    /// Job id, used as the message id in logs.
    pub id: String,
    /// Attempts made so far.
    pub attempts: u32,
    /// The ping.
    pub ping: QueuedPing,
}

/// Queue errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueueError {
    /// The queue holds as many jobs as it can.
    #[error("queue is full")]
    Full,
    /// The worker side is gone.
    #[error("queue is closed")]
    Closed,
}

/// Destination of accepted pings.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Queue a ping, returning the job id.
    async fn enqueue(&self, ping: QueuedPing) -> Result<String, QueueError>;

    /// Whether jobs can still be queued.
    async fn is_alive(&self) -> bool;
}
