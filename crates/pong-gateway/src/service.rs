//! Pong gateway service: builds the router for the configured generation
//! and serves it until shut down.

use crate::domain::{GatewayConfig, GatewayError, ServiceMode};
use crate::middleware::{TimeoutLayer, TracingLayer};
use crate::routes::{events, parcels};
use axum::{extract::DefaultBodyLimit, Router};
use std::future::Future;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info};

/// Ingress handlers for one generation of the service.
pub enum Ingress {
    /// CloudEvents in, CloudEvents out.
    Events(events::EventsState),
    /// Parcels in via the ping queue, parcels out to gateways.
    Parcels(parcels::ParcelsState),
}

impl Ingress {
    fn mode(&self) -> ServiceMode {
        match self {
            Self::Events(_) => ServiceMode::Events,
            Self::Parcels(_) => ServiceMode::Parcels,
        }
    }
}

/// HTTP front of the pong responder
pub struct PongGatewayService {
    config: GatewayConfig,
    ingress: Ingress,
}

impl PongGatewayService {
    /// Create the service, validating the configuration against the ingress.
    pub fn new(config: GatewayConfig, ingress: Ingress) -> Result<Self, GatewayError> {
        config
            .validate()
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        if config.mode != ingress.mode() {
            return Err(GatewayError::Config(format!(
                "configured for {} but given {} ingress",
                config.mode,
                ingress.mode()
            )));
        }

        Ok(Self { config, ingress })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Router with the full middleware stack.
    pub fn router(&self) -> Router {
        let routes = match &self.ingress {
            Ingress::Events(state) => events::router(state.clone()),
            Ingress::Parcels(state) => parcels::router(state.clone()),
        };

        routes
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(self.config.limits.max_request_size))
            .layer(
                ServiceBuilder::new()
                    .layer(TracingLayer::new())
                    .layer(TimeoutLayer::new(self.config.timeouts.request)),
            )
    }

    /// Bind the configured address and serve until `shutdown` resolves.
    pub async fn start<F>(&self, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.http_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| GatewayError::Bind(format!("{addr}: {e}")))?;

        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener
            .local_addr()
            .map_err(|e| GatewayError::Bind(e.to_string()))?;
        info!(addr = %addr, mode = %self.config.mode, "Pong gateway listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| {
                error!(error = %e, "Pong gateway failed");
                GatewayError::Serve(e.to_string())
            })?;

        info!("Pong gateway stopped");
        Ok(())
    }
}
