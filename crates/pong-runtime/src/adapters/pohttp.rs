//! PoHTTP delivery of pong parcels to gateways.

use async_trait::async_trait;
use pong_core::{DeliveryError, PongDelivery};
use reqwest::{header::CONTENT_TYPE, Client, StatusCode};
use std::time::Duration;
use tracing::debug;

/// Content type of parcels on the wire
pub const PARCEL_CONTENT_TYPE: &str = "application/vnd.awala.parcel";

/// Posts parcels to the gateway named in the ping job.
pub struct PoHttpDelivery {
    client: Client,
}

impl PoHttpDelivery {
    /// Create a delivery whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
        })
    }
}

/// Gateway addresses may be bare host names.
fn gateway_url(gateway_address: &str) -> String {
    if gateway_address.starts_with("https://") || gateway_address.starts_with("http://") {
        gateway_address.to_string()
    } else {
        format!("https://{gateway_address}")
    }
}

#[async_trait]
impl PongDelivery for PoHttpDelivery {
    async fn deliver(&self, gateway_address: &str, parcel: &[u8]) -> Result<(), DeliveryError> {
        let url = gateway_url(gateway_address);
        debug!(url = %url, size = parcel.len(), "Delivering parcel");

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, PARCEL_CONTENT_TYPE)
            .body(parcel.to_vec())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DeliveryError::Timeout
                } else {
                    DeliveryError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        match status {
            StatusCode::FORBIDDEN | StatusCode::UNPROCESSABLE_ENTITY => {
                let reason = response.text().await.unwrap_or_default();
                Err(DeliveryError::InvalidParcel(if reason.is_empty() {
                    status.to_string()
                } else {
                    reason
                }))
            }
            _ => Err(DeliveryError::Rejected {
                status: status.as_u16(),
            }),
        }
    }
}
