//! # Parcel Generation Flow
//!
//! Parcel ingress through the ping queue and worker to gateway delivery.
//!
//! ```text
//! POST / (parcel) → screen → InMemoryJobQueue → QueueWorker
//!                                                   ↓
//!                                          ParcelPongService → gateway
//! ```

#[cfg(test)]
mod tests {
    use crate::fixtures::{certificate, identity_key, json_ping};
    use axum::body::{Body, Bytes};
    use axum::extract::State;
    use axum::http::{header, Request, StatusCode};
    use axum::routing::post;
    use axum::Router;
    use pong_core::test_utils::{RecordingDelivery, StubParcel, StubParcelTransport};
    use base64::{engine::general_purpose::STANDARD, Engine};
    use pong_core::{
        Certificate, DeliveryError, JsonPingCodec, MemoryKeyStore, ParcelPingApi,
        ParcelPongService, PingOutcome, PongError, SystemClock, PING_CONTENT_TYPE,
        PONG_CONTENT_TYPE,
    };
    use pong_gateway::queue::QueueJob;
    use pong_gateway::{
        GatewayConfig, InMemoryJobQueue, JobResult, QueueWorker, QueuedPing, ServiceMode,
        GATEWAY_HEADER, PARCEL_CONTENT_TYPE,
    };
    use pong_runtime::PongContainer;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::sync::{oneshot, watch};
    use tower::ServiceExt;

    // =========================================================================
    // FIXTURES
    // =========================================================================

    struct Endpoint {
        us: Certificate,
        key_store: Arc<MemoryKeyStore>,
    }

    async fn endpoint() -> Endpoint {
        let us = certificate("pong endpoint");
        let key_store = Arc::new(MemoryKeyStore::new());
        key_store.add_identity_key(identity_key(&us)).await;
        Endpoint { us, key_store }
    }

    fn parcels_config() -> GatewayConfig {
        let mut config = GatewayConfig {
            mode: ServiceMode::Parcels,
            ..GatewayConfig::default()
        };
        config.queue.retry_backoff = Duration::from_millis(10);
        config
    }

    fn ping_parcel(recipient: &str, sender: &Certificate, id: &str) -> Vec<u8> {
        StubParcel::new(recipient, sender, PING_CONTENT_TYPE, json_ping(id)).to_bytes()
    }

    fn post_parcel(parcel: Vec<u8>, gateway: &str) -> Request<Body> {
        Request::post("/")
            .header(header::CONTENT_TYPE, PARCEL_CONTENT_TYPE)
            .header(GATEWAY_HEADER, gateway)
            .body(Body::from(parcel))
            .unwrap()
    }

    type Received = Arc<Mutex<Vec<Vec<u8>>>>;

    /// A PoHTTP gateway that accepts every parcel.
    async fn mock_gateway() -> (String, Received) {
        let received: Received = Arc::default();
        let router = Router::new()
            .route(
                "/",
                post(|State(received): State<Received>, body: Bytes| async move {
                    received.lock().unwrap().push(body.to_vec());
                    StatusCode::ACCEPTED
                }),
            )
            .with_state(received.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        (format!("http://{addr}/"), received)
    }

    async fn wait_for<F: Fn() -> bool>(condition: F) -> bool {
        for _ in 0..200 {
            if condition() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    // =========================================================================
    // END-TO-END OVER SOCKETS
    // =========================================================================

    #[tokio::test]
    async fn test_ping_parcel_answered_through_gateway() {
        let endpoint = endpoint().await;
        let sender = certificate("ping sender");
        let (gateway_url, received) = mock_gateway().await;

        let container = PongContainer::builder(parcels_config())
            .with_transport(Arc::new(StubParcelTransport::new()))
            .with_key_store(endpoint.key_store.clone())
            .build()
            .unwrap();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, stopped) = oneshot::channel::<()>();
        let server = tokio::spawn(container.run_on(listener, async move {
            let _ = stopped.await;
        }));

        let response = reqwest::Client::new()
            .post(format!("http://{addr}/"))
            .header(header::CONTENT_TYPE, PARCEL_CONTENT_TYPE)
            .header(GATEWAY_HEADER, &gateway_url)
            .body(ping_parcel(endpoint.us.private_address(), &sender, "the ping id"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        assert!(wait_for(|| !received.lock().unwrap().is_empty()).await);
        let pong = StubParcel::from_bytes(&received.lock().unwrap()[0]).unwrap();
        assert_eq!(pong.content_type, PONG_CONTENT_TYPE);
        assert_eq!(pong.content, b"the ping id");
        assert_eq!(pong.recipient, sender.private_address());

        stop.send(()).unwrap();
        server.await.unwrap().unwrap();
    }

    // =========================================================================
    // RECIPIENT SCREENING
    // =========================================================================

    #[tokio::test]
    async fn test_unknown_private_recipient_accepted_without_delivery() {
        let endpoint = endpoint().await;
        let delivery = Arc::new(RecordingDelivery::new());
        let mut container = PongContainer::builder(parcels_config())
            .with_transport(Arc::new(StubParcelTransport::new()))
            .with_key_store(endpoint.key_store.clone())
            .with_delivery(delivery.clone())
            .build()
            .unwrap();
        let (stop, stop_signal) = watch::channel(false);
        let worker = container.spawn_worker(stop_signal).unwrap();

        let stranger = certificate("someone else").private_address().to_string();
        let response = container
            .router()
            .oneshot(post_parcel(
                ping_parcel(&stranger, &certificate("ping sender"), "the ping id"),
                "https://gw.example",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(delivery.deliveries().is_empty());

        stop.send(true).unwrap();
        worker.await.unwrap();
    }

    #[tokio::test]
    async fn test_known_recipient_delivered_to_header_gateway() {
        let endpoint = endpoint().await;
        let delivery = Arc::new(RecordingDelivery::new());
        let mut container = PongContainer::builder(parcels_config())
            .with_transport(Arc::new(StubParcelTransport::new()))
            .with_key_store(endpoint.key_store.clone())
            .with_delivery(delivery.clone())
            .build()
            .unwrap();
        let (stop, stop_signal) = watch::channel(false);
        let worker = container.spawn_worker(stop_signal).unwrap();

        let response = container
            .router()
            .oneshot(post_parcel(
                ping_parcel(endpoint.us.private_address(), &certificate("ping sender"), "abc"),
                "https://gw.example",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        assert!(wait_for(|| !delivery.deliveries().is_empty()).await);
        assert_eq!(delivery.deliveries()[0].0, "https://gw.example");

        stop.send(true).unwrap();
        worker.await.unwrap();
    }

    // =========================================================================
    // DELIVERY FAILURES
    // =========================================================================

    fn service(endpoint: &Endpoint, delivery: RecordingDelivery) -> Arc<ParcelPongService> {
        Arc::new(ParcelPongService::new(
            Box::new(JsonPingCodec),
            Arc::new(StubParcelTransport::new()),
            endpoint.key_store.clone(),
            Arc::new(delivery),
            Arc::new(SystemClock),
        ))
    }

    fn job(parcel: &[u8]) -> QueueJob {
        QueueJob {
            id: "job-1".to_string(),
            attempts: 0,
            ping: QueuedPing {
                parcel: STANDARD.encode(parcel),
                gateway_address: Some("https://gw.example".to_string()),
            },
        }
    }

    #[tokio::test]
    async fn test_refused_delivery_completes_the_job() {
        let endpoint = endpoint().await;
        let service = service(
            &endpoint,
            RecordingDelivery::failing(DeliveryError::InvalidParcel("bad signature".into())),
        );
        let (_queue, receiver) = InMemoryJobQueue::new(4);
        let worker = QueueWorker::new(service, receiver, parcels_config().queue);
        let parcel = ping_parcel(endpoint.us.private_address(), &certificate("ping sender"), "abc");

        let result = worker.process(&job(&parcel)).await;

        assert!(matches!(
            result,
            JobResult::Completed(PingOutcome::DeliveryRefused { ref destination, .. })
                if destination == "https://gw.example"
        ));
    }

    #[tokio::test]
    async fn test_other_delivery_errors_propagate_unchanged() {
        let endpoint = endpoint().await;
        let failure = DeliveryError::Network("connection reset".into());
        let service = service(&endpoint, RecordingDelivery::failing(failure.clone()));
        let parcel = ping_parcel(endpoint.us.private_address(), &certificate("ping sender"), "abc");

        let error = service
            .process_ping(&parcel, Some("https://gw.example"), "job-1")
            .await
            .unwrap_err();
        assert!(matches!(error, PongError::Delivery(ref e) if *e == failure));

        let (_queue, receiver) = InMemoryJobQueue::new(4);
        let worker = QueueWorker::new(service, receiver, parcels_config().queue);
        assert_eq!(
            worker.process(&job(&parcel)).await,
            JobResult::Retry { attempts: 1 }
        );
    }
}
