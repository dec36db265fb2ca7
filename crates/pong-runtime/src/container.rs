//! # Service Container
//!
//! Builds every port for the configured generation and owns their
//! lifecycle. Defaults come from the configuration; each port can be
//! replaced through the builder. The binary always configures an event
//! sink, so the in-process bus only backs embedded and test setups.
//!
//! ```text
//! events:   EventPongService ─→ HttpEventSink | InMemoryEventBus
//! parcels:  ParcelPongService ─→ ParcelTransport (injected)
//!                             ├→ VaultKeyStore | MemoryKeyStore
//!                             └→ PoHttpDelivery
//!           InMemoryJobQueue ─→ QueueWorker
//! ```

use crate::adapters::{HttpEventSink, PoHttpDelivery, VaultKeyStore};
use axum::Router;
use pong_bus::{EventPublisher, InMemoryEventBus};
use pong_core::{
    Clock, EventPongService, MemoryKeyStore, ParcelPongService, ParcelTransport, PongDelivery,
    PrivateKeyStore, SystemClock,
};
use pong_gateway::{
    EventsState, GatewayConfig, GatewayError, InMemoryJobQueue, Ingress, ParcelsState,
    PongGatewayService, QueueWorker, ServiceMode,
};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Errors building the container
#[derive(Debug, Error)]
pub enum ContainerError {
    /// Gateway rejected the configuration
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// An HTTP client could not be created
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Parcel mode needs a transport to decrypt and seal parcels
    #[error("parcel mode requires a parcel transport")]
    MissingTransport,
}

/// Builder for [`PongContainer`]
pub struct ContainerBuilder {
    config: GatewayConfig,
    transport: Option<Arc<dyn ParcelTransport>>,
    key_store: Option<Arc<dyn PrivateKeyStore>>,
    delivery: Option<Arc<dyn PongDelivery>>,
    publisher: Option<Arc<dyn EventPublisher>>,
    clock: Arc<dyn Clock>,
}

impl ContainerBuilder {
    pub fn with_transport(mut self, transport: Arc<dyn ParcelTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_key_store(mut self, key_store: Arc<dyn PrivateKeyStore>) -> Self {
        self.key_store = Some(key_store);
        self
    }

    pub fn with_delivery(mut self, delivery: Arc<dyn PongDelivery>) -> Self {
        self.delivery = Some(delivery);
        self
    }

    pub fn with_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Build the ports and the gateway.
    pub fn build(self) -> Result<PongContainer, ContainerError> {
        match self.config.mode {
            ServiceMode::Events => self.build_events(),
            ServiceMode::Parcels => self.build_parcels(),
        }
    }

    fn build_events(self) -> Result<PongContainer, ContainerError> {
        let mut event_bus = None;
        let publisher: Arc<dyn EventPublisher> = match (self.publisher, &self.config.event_sink) {
            (Some(publisher), _) => publisher,
            (None, Some(url)) => {
                info!(sink = %url, "Emitting pongs to HTTP event sink");
                Arc::new(HttpEventSink::new(url.clone(), self.config.timeouts.outbound)?)
            }
            // Pongs fail to emit until someone subscribes to `event_bus()`
            (None, None) => {
                info!("Emitting pongs on the in-process event bus");
                let bus = Arc::new(InMemoryEventBus::new());
                event_bus = Some(Arc::clone(&bus));
                bus
            }
        };

        let service = EventPongService::new(
            self.config.endpoint.id.clone(),
            self.config.ping_format.codec(),
            publisher,
        );
        let gateway = PongGatewayService::new(
            self.config,
            Ingress::Events(EventsState {
                service: Arc::new(service),
            }),
        )?;

        Ok(PongContainer {
            gateway,
            worker: None,
            event_bus,
        })
    }

    fn build_parcels(self) -> Result<PongContainer, ContainerError> {
        let transport = self.transport.ok_or(ContainerError::MissingTransport)?;

        let key_store: Arc<dyn PrivateKeyStore> = match (self.key_store, &self.config.vault) {
            (Some(key_store), _) => key_store,
            (None, Some(vault)) => {
                info!(url = %vault.url, "Using Vault key store");
                Arc::new(VaultKeyStore::new(vault, self.config.timeouts.outbound)?)
            }
            (None, None) => {
                warn!("No Vault configured; keys are held in memory and lost on restart");
                Arc::new(MemoryKeyStore::new())
            }
        };

        let delivery: Arc<dyn PongDelivery> = match self.delivery {
            Some(delivery) => delivery,
            None => Arc::new(PoHttpDelivery::new(self.config.timeouts.outbound)?),
        };

        let service: Arc<ParcelPongService> = Arc::new(ParcelPongService::new(
            self.config.ping_format.codec(),
            transport,
            key_store,
            delivery,
            self.clock,
        ));

        let (queue, receiver) = InMemoryJobQueue::new(self.config.queue.capacity);
        let worker = QueueWorker::new(service.clone(), receiver, self.config.queue.clone());
        let public_address = self.config.endpoint.public_address.clone();

        let gateway = PongGatewayService::new(
            self.config,
            Ingress::Parcels(ParcelsState {
                service,
                queue: Arc::new(queue),
                public_address,
            }),
        )?;

        Ok(PongContainer {
            gateway,
            worker: Some(worker),
            event_bus: None,
        })
    }
}

/// Everything the pong responder runs.
pub struct PongContainer {
    gateway: PongGatewayService,
    worker: Option<QueueWorker>,
    event_bus: Option<Arc<InMemoryEventBus>>,
}

impl PongContainer {
    /// Start building a container for `config`.
    pub fn builder(config: GatewayConfig) -> ContainerBuilder {
        ContainerBuilder {
            config,
            transport: None,
            key_store: None,
            delivery: None,
            publisher: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// HTTP router with the full middleware stack.
    pub fn router(&self) -> Router {
        self.gateway.router()
    }

    /// In-process bus pongs are emitted on, when no sink is configured.
    /// Emitting fails while it has no subscriber.
    pub fn event_bus(&self) -> Option<Arc<InMemoryEventBus>> {
        self.event_bus.clone()
    }

    pub fn config(&self) -> &GatewayConfig {
        self.gateway.config()
    }

    /// Start the queue worker, if any, until `shutdown` flips to `true`.
    pub fn spawn_worker(&mut self, shutdown: watch::Receiver<bool>) -> Option<JoinHandle<()>> {
        self.worker
            .take()
            .map(|worker| tokio::spawn(worker.run(shutdown)))
    }

    /// Bind the configured address and run until `shutdown` resolves.
    pub async fn run<F>(self, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config().http_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| GatewayError::Bind(format!("{addr}: {e}")))?;
        self.run_on(listener, shutdown).await
    }

    /// Run on an already bound listener until `shutdown` resolves.
    pub async fn run_on<F>(mut self, listener: TcpListener, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (worker_shutdown, worker_signal) = watch::channel(false);
        let worker = self.spawn_worker(worker_signal);

        let result = self.gateway.serve(listener, shutdown).await;

        // Stop taking jobs once no more pings can arrive
        let _ = worker_shutdown.send(true);
        if let Some(handle) = worker {
            if let Err(e) = handle.await {
                error!(error = %e, "Queue worker panicked");
            }
        }

        info!("Pong responder stopped");
        result
    }
}
