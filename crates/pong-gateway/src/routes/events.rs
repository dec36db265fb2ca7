//! CloudEvents ingress.
//!
//! Incoming service messages arrive in binary content mode. The pong itself
//! goes out on the event bus, so the HTTP response only reports how the ping
//! was classified.

use super::{banner, method_not_allowed};
use crate::domain::ApiError;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use pong_bus::http_binding;
use pong_core::{EventPingApi, PingOutcome};
use std::sync::Arc;
use tracing::info;

/// Shared state of the events route.
#[derive(Clone)]
pub struct EventsState {
    /// Ping classifier and pong emitter.
    pub service: Arc<dyn EventPingApi>,
}

/// Router for the CloudEvents generation.
pub fn router(state: EventsState) -> Router {
    Router::new()
        .route(
            "/",
            get(banner)
                .post(receive_event)
                .fallback(method_not_allowed),
        )
        .with_state(state)
}

async fn receive_event(
    State(state): State<EventsState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let event = match http_binding::decode_binary(&headers, body) {
        Ok(event) => event,
        Err(e) => {
            info!(reason = %e, "Refusing malformed CloudEvent");
            return ApiError::bad_request(e.to_string()).into_response();
        }
    };

    // Hard failures are logged by the service
    match state.service.handle_event(event).await {
        Ok(outcome) => outcome_response(&outcome),
        Err(_) => ApiError::internal("Failed to emit pong").into_response(),
    }
}

/// Map a ping classification onto the HTTP answer.
fn outcome_response(outcome: &PingOutcome) -> Response {
    match outcome {
        PingOutcome::Dispatched { .. } => StatusCode::NO_CONTENT.into_response(),
        PingOutcome::WrongRecipient { .. } => {
            ApiError::forbidden(outcome.to_string()).into_response()
        }
        PingOutcome::InvalidServiceMessage { .. }
        | PingOutcome::InvalidServiceMessageType { .. }
        | PingOutcome::InvalidPing { .. }
        | PingOutcome::DeliveryRefused { .. }
        | PingOutcome::NoDestination => ApiError::bad_request(outcome.to_string()).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request};
    use pong_bus::{
        CloudEvent, EventFilter, EventPublisher, EventSubscriber, InMemoryEventBus,
        INCOMING_SERVICE_MESSAGE_TYPE,
    };
    use pong_core::test_utils::certificate;
    use pong_core::{CertificationPath, EventPongService, JsonPingCodec, PING_CONTENT_TYPE};
    use tower::ServiceExt;

    const ENDPOINT_ID: &str = "0pong";

    fn ping(id: &str) -> Vec<u8> {
        let path = CertificationPath::new(certificate("pda"), vec![certificate("sender")]);
        JsonPingCodec.encode(&path, Some(id)).unwrap()
    }

    fn app(bus: Arc<InMemoryEventBus>) -> Router {
        router(EventsState {
            service: Arc::new(EventPongService::new(
                ENDPOINT_ID,
                Box::new(JsonPingCodec),
                bus,
            )),
        })
    }

    fn event_request(event: &CloudEvent) -> Request<Body> {
        let (headers, body) = http_binding::encode_binary(event).unwrap();
        let mut request = Request::post("/").body(Body::from(body)).unwrap();
        *request.headers_mut() = headers;
        request
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_banner() {
        let response = app(Arc::new(InMemoryEventBus::new()))
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_other_methods_not_allowed() {
        let response = app(Arc::new(InMemoryEventBus::new()))
            .oneshot(Request::put("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "GET, HEAD, POST");
    }

    #[tokio::test]
    async fn test_valid_ping_answers_no_content() {
        let bus = Arc::new(InMemoryEventBus::new());
        let mut pongs = bus.subscribe(EventFilter::all());
        let event = CloudEvent::new(INCOMING_SERVICE_MESSAGE_TYPE, "0peer", ping("abc"))
            .with_subject(ENDPOINT_ID)
            .with_content_type(PING_CONTENT_TYPE);

        let response = app(bus.clone()).oneshot(event_request(&event)).await.unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let pong = pongs.try_recv().unwrap().unwrap();
        assert_eq!(pong.data, b"abc");
    }

    #[tokio::test]
    async fn test_pong_nobody_receives_is_server_error() {
        let bus = Arc::new(InMemoryEventBus::new());
        let event = CloudEvent::new(INCOMING_SERVICE_MESSAGE_TYPE, "0peer", ping("abc"))
            .with_subject(ENDPOINT_ID)
            .with_content_type(PING_CONTENT_TYPE);

        let response = app(bus.clone()).oneshot(event_request(&event)).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["message"], "Failed to emit pong");
        assert_eq!(bus.events_published(), 0);
    }

    #[tokio::test]
    async fn test_missing_ce_headers() {
        let response = app(Arc::new(InMemoryEventBus::new()))
            .oneshot(Request::post("/").body(Body::from("{}")).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_foreign_content_type_named_in_error() {
        let event = CloudEvent::new(INCOMING_SERVICE_MESSAGE_TYPE, "0peer", b"hi".to_vec())
            .with_subject(ENDPOINT_ID)
            .with_content_type("text/plain");

        let response = app(Arc::new(InMemoryEventBus::new()))
            .oneshot(event_request(&event))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let message = body_json(response).await["message"].as_str().unwrap().to_string();
        assert!(message.contains("text/plain"));
    }

    #[tokio::test]
    async fn test_wrong_subject_forbidden() {
        let event = CloudEvent::new(INCOMING_SERVICE_MESSAGE_TYPE, "0peer", ping("abc"))
            .with_subject("0someone-else")
            .with_content_type(PING_CONTENT_TYPE);

        let response = app(Arc::new(InMemoryEventBus::new()))
            .oneshot(event_request(&event))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_undecodable_ping() {
        let event = CloudEvent::new(INCOMING_SERVICE_MESSAGE_TYPE, "0peer", b"nope".to_vec())
            .with_subject(ENDPOINT_ID)
            .with_content_type(PING_CONTENT_TYPE);

        let response = app(Arc::new(InMemoryEventBus::new()))
            .oneshot(event_request(&event))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
