//! HTTP CloudEvent sink: emits pong events in binary content mode to a
//! broker URL (Knative-style).

use async_trait::async_trait;
use pong_bus::{http_binding, CloudEvent, EmitError, EventPublisher};
use reqwest::Client;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

/// Publishes events by POSTing them to a fixed URL.
pub struct HttpEventSink {
    client: Client,
    url: String,
    events_published: AtomicU64,
}

impl HttpEventSink {
    /// Create a sink posting to `url`, giving up after `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            url: url.into(),
            events_published: AtomicU64::new(0),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl EventPublisher for HttpEventSink {
    async fn publish(&self, event: CloudEvent) -> Result<usize, EmitError> {
        let (headers, body) =
            http_binding::encode_binary(&event).map_err(|e| EmitError::Transport(e.to_string()))?;

        let response = self
            .client
            .post(&self.url)
            .headers(headers)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmitError::Timeout
                } else {
                    EmitError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(EmitError::Refused {
                status: status.as_u16(),
            });
        }

        self.events_published.fetch_add(1, Ordering::Relaxed);
        debug!(event_id = %event.id, sink = %self.url, "Event emitted");
        Ok(1)
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}
