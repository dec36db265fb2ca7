//! Queue worker: answers queued pings and retries hard failures.

use super::{JobReceiver, QueueJob};
use crate::domain::QueueConfig;
use base64::{engine::general_purpose::STANDARD, Engine};
use pong_core::{ParcelPingApi, PingOutcome};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// What became of one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobResult {
    /// Processed to a final outcome, dispatched or not.
    Completed(PingOutcome),
    /// Failed; it will be attempted again.
    Retry {
        /// Attempts made so far.
        attempts: u32,
    },
    /// Failed for good and dropped.
    Abandoned,
}

/// Consumes the ping queue.
pub struct QueueWorker {
    service: Arc<dyn ParcelPingApi>,
    receiver: JobReceiver,
    config: QueueConfig,
}

impl QueueWorker {
    pub fn new(service: Arc<dyn ParcelPingApi>, receiver: JobReceiver, config: QueueConfig) -> Self {
        Self {
            service,
            receiver,
            config,
        }
    }

    /// Process jobs until `shutdown` flips to `true` or the queue is dropped.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            max_attempts = self.config.max_attempts,
            "Ping queue worker started"
        );

        loop {
            let job = tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
                job = self.receiver.recv() => match job {
                    Some(job) => job,
                    None => break,
                },
            };

            if let JobResult::Retry { attempts } = self.process(&job).await {
                let retry = QueueJob { attempts, ..job };
                self.receiver
                    .requeue_after(retry, self.config.retry_backoff);
            }
        }

        info!("Ping queue worker stopped");
    }

    /// Make one attempt at `job`.
    pub async fn process(&self, job: &QueueJob) -> JobResult {
        let parcel = match STANDARD.decode(&job.ping.parcel) {
            Ok(parcel) => parcel,
            Err(e) => {
                error!(job_id = %job.id, error = %e, "Dropping job with undecodable parcel");
                return JobResult::Abandoned;
            }
        };

        let result = self
            .service
            .process_ping(&parcel, job.ping.gateway_address.as_deref(), &job.id)
            .await;

        match result {
            Ok(outcome) => JobResult::Completed(outcome),
            Err(e) => {
                let attempts = job.attempts + 1;
                if attempts < self.config.max_attempts {
                    warn!(job_id = %job.id, attempts, error = %e, "Ping job failed; will retry");
                    JobResult::Retry { attempts }
                } else {
                    error!(job_id = %job.id, attempts, error = %e, "Ping job failed; giving up");
                    JobResult::Abandoned
                }
            }
        }
    }
}
