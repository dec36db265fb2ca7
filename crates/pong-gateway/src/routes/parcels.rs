//! PoHTTP parcel ingress.
//!
//! Parcels are screened synchronously (content type, envelope, recipient)
//! and queued. Unwrapping and answering happens in the queue worker.

use super::{method_not_allowed, BANNER};
use crate::domain::ApiError;
use crate::queue::{JobQueue, QueuedPing};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use pong_core::{ParcelPingApi, RecipientAddress};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

/// Content type of PoHTTP parcel deliveries
pub const PARCEL_CONTENT_TYPE: &str = "application/vnd.awala.parcel";

/// Header naming the gateway the parcel came through
pub const GATEWAY_HEADER: &str = "x-awala-gateway";

/// Shared state of the parcels route.
#[derive(Clone)]
pub struct ParcelsState {
    /// Parcel inspection and ping processing.
    pub service: Arc<dyn ParcelPingApi>,
    /// Where accepted pings wait.
    pub queue: Arc<dyn JobQueue>,
    /// Internet host name parcels may be addressed to.
    pub public_address: Option<String>,
}

/// Router for the parcel generation.
pub fn router(state: ParcelsState) -> Router {
    Router::new()
        .route(
            "/",
            get(queue_banner)
                .post(receive_parcel)
                .fallback(method_not_allowed),
        )
        .with_state(state)
}

async fn queue_banner(State(state): State<ParcelsState>) -> Response {
    if state.queue.is_alive().await {
        BANNER.into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "Ping queue is unavailable").into_response()
    }
}

async fn receive_parcel(
    State(state): State<ParcelsState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if content_type != PARCEL_CONTENT_TYPE {
        return Err(ApiError::unsupported_media_type(format!(
            "Content type must be {PARCEL_CONTENT_TYPE}"
        )));
    }

    let envelope = state.service.inspect_parcel(&body).map_err(|e| {
        info!(reason = %e, "Refusing invalid parcel");
        ApiError::forbidden("Payload is not a valid RAMF-serialized parcel")
    })?;

    match &envelope.recipient {
        RecipientAddress::Private(address) => {
            let known = state
                .service
                .is_local_recipient(address)
                .await
                .map_err(|e| {
                    error!(parcel_id = %envelope.id, error = %e, "Could not look up recipient");
                    ApiError::internal("Could not check parcel recipient")
                })?;
            if !known {
                info!(
                    parcel_id = %envelope.id,
                    recipient = %address,
                    "Ignoring parcel for unknown private address"
                );
                return Ok(accepted());
            }
        }
        recipient @ RecipientAddress::Public(_) => {
            let ours = state
                .public_address
                .as_deref()
                .is_some_and(|host| recipient.is_public_host(host));
            if !ours {
                info!(parcel_id = %envelope.id, recipient = %recipient, "Refusing parcel for another host");
                return Err(ApiError::forbidden(
                    "Parcel is bound for recipient with different public address",
                ));
            }
        }
    }

    let gateway_address = headers
        .get(GATEWAY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let ping = QueuedPing {
        parcel: STANDARD.encode(&body),
        gateway_address,
    };

    let job_id = state.queue.enqueue(ping).await.map_err(|e| {
        error!(parcel_id = %envelope.id, error = %e, "Could not queue ping");
        ApiError::internal("Could not queue ping message")
    })?;
    info!(parcel_id = %envelope.id, job_id = %job_id, "Ping queued");

    Ok(accepted())
}

fn accepted() -> Response {
    (StatusCode::ACCEPTED, Json(json!({}))).into_response()
}
