//! In-process job queue over a bounded channel.

use super::{JobQueue, QueueError, QueueJob, QueuedPing};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Sending half of the queue, held by the HTTP routes.
#[derive(Clone)]
pub struct InMemoryJobQueue {
    sender: mpsc::Sender<QueueJob>,
}

/// Receiving half of the queue, consumed by the worker.
///
/// Retries are sent back through a weak handle, so the channel closes once
/// every [`InMemoryJobQueue`] and pending retry is gone.
pub struct JobReceiver {
    pub(crate) receiver: mpsc::Receiver<QueueJob>,
    pub(crate) requeue: mpsc::WeakSender<QueueJob>,
}

impl InMemoryJobQueue {
    /// Create a queue holding up to `capacity` jobs.
    pub fn new(capacity: usize) -> (Self, JobReceiver) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let requeue = sender.downgrade();
        (Self { sender }, JobReceiver { receiver, requeue })
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn enqueue(&self, ping: QueuedPing) -> Result<String, QueueError> {
        let job = QueueJob {
            id: Uuid::new_v4().to_string(),
            attempts: 0,
            ping,
        };
        let id = job.id.clone();

        self.sender.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                warn!("Ping queue is full");
                QueueError::Full
            }
            mpsc::error::TrySendError::Closed(_) => QueueError::Closed,
        })?;

        debug!(job_id = %id, "Queued ping");
        Ok(id)
    }

    async fn is_alive(&self) -> bool {
        !self.sender.is_closed()
    }
}

impl JobReceiver {
    /// Next job, or `None` once every queue handle and pending retry is gone.
    pub async fn recv(&mut self) -> Option<QueueJob> {
        self.receiver.recv().await
    }

    /// Put `job` back after `delay`.
    ///
    /// The pending retry keeps the channel open until it is sent.
    pub(crate) fn requeue_after(&self, job: QueueJob, delay: Duration) {
        let Some(requeue) = self.requeue.upgrade() else {
            warn!(job_id = %job.id, "Ping queue closed; dropping retry");
            return;
        };
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if requeue.send(job).await.is_err() {
                warn!("Ping queue closed before retry");
            }
        });
    }
}
