//! # Event Generation Flow
//!
//! CloudEvent ingress through the runtime container to the in-process bus.
//!
//! ```text
//! POST / (binary CloudEvent) → EventPongService → InMemoryEventBus
//! ```

#[cfg(test)]
mod tests {
    use crate::fixtures::{binary_ping, json_ping, ENDPOINT_ID, PEER_ID};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use pong_bus::{
        http_binding, CloudEvent, EventFilter, EventSubscriber, Subscription,
        INCOMING_SERVICE_MESSAGE_TYPE, OUTGOING_SERVICE_MESSAGE_TYPE,
    };
    use pong_core::{PingFormat, PING_CONTENT_TYPE, PONG_CONTENT_TYPE};
    use pong_gateway::GatewayConfig;
    use pong_runtime::PongContainer;
    use tower::ServiceExt;

    // =========================================================================
    // FIXTURES
    // =========================================================================

    fn container(format: PingFormat) -> PongContainer {
        let mut config = GatewayConfig::default();
        config.endpoint.id = ENDPOINT_ID.to_string();
        config.ping_format = format;
        PongContainer::builder(config).build().unwrap()
    }

    fn subscribe(container: &PongContainer) -> Subscription {
        container
            .event_bus()
            .expect("in-process bus")
            .subscribe(EventFilter::all())
    }

    fn ping_event(data: Vec<u8>, content_type: &str) -> CloudEvent {
        CloudEvent::new(INCOMING_SERVICE_MESSAGE_TYPE, PEER_ID, data)
            .with_subject(ENDPOINT_ID)
            .with_content_type(content_type)
    }

    async fn post(container: &PongContainer, event: &CloudEvent) -> Response {
        let (headers, body) = http_binding::encode_binary(event).unwrap();
        let mut request = Request::post("/").body(Body::from(body)).unwrap();
        *request.headers_mut() = headers;
        container.router().oneshot(request).await.unwrap()
    }

    async fn message(response: Response) -> String {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        json["message"].as_str().unwrap_or_default().to_string()
    }

    // =========================================================================
    // TESTS
    // =========================================================================

    #[tokio::test]
    async fn test_ping_answered_with_exactly_one_pong() {
        let container = container(PingFormat::Json);
        let mut pongs = subscribe(&container);

        let response = post(&container, &ping_event(json_ping("the ping id"), PING_CONTENT_TYPE)).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let pong = pongs.try_recv().unwrap().expect("one pong");
        assert_eq!(pong.event_type, OUTGOING_SERVICE_MESSAGE_TYPE);
        assert_eq!(pong.source, ENDPOINT_ID);
        assert_eq!(pong.subject.as_deref(), Some(PEER_ID));
        assert_eq!(pong.datacontenttype.as_deref(), Some(PONG_CONTENT_TYPE));
        assert_eq!(pong.data, b"the ping id");

        assert!(pongs.try_recv().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_binary_ping_answered() {
        let container = container(PingFormat::Binary);
        let mut pongs = subscribe(&container);
        let id = [b'x'; 36];

        let response = post(&container, &ping_event(binary_ping(&id), PING_CONTENT_TYPE)).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let pong = pongs.try_recv().unwrap().expect("one pong");
        assert_eq!(pong.data, id.to_vec());
    }

    #[tokio::test]
    async fn test_malformed_envelope_has_no_side_effects() {
        let container = container(PingFormat::Json);
        let mut pongs = subscribe(&container);

        let response = container
            .router()
            .oneshot(
                Request::post("/")
                    .header("ce-specversion", "1.0")
                    .header("ce-id", "1")
                    .body(Body::from("not an event"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(pongs.try_recv().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_foreign_content_type_is_named() {
        let container = container(PingFormat::Json);
        let mut pongs = subscribe(&container);

        let response = post(
            &container,
            &ping_event(json_ping("the ping id"), "application/vnd.example.other"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(message(response).await.contains("application/vnd.example.other"));
        assert!(pongs.try_recv().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_ping_has_no_side_effects() {
        let container = container(PingFormat::Json);
        let mut pongs = subscribe(&container);

        let response = post(&container, &ping_event(b"{}".to_vec(), PING_CONTENT_TYPE)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(pongs.try_recv().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ping_for_other_endpoint_refused() {
        let container = container(PingFormat::Json);
        let mut pongs = subscribe(&container);
        let event = ping_event(json_ping("the ping id"), PING_CONTENT_TYPE).with_subject("0other");

        let response = post(&container, &event).await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(pongs.try_recv().unwrap().is_none());
    }
}
