//! # Curbside Market Runtime
//!
//! Process wiring for the Curbside server: one Room Router and Presence
//! Registry shared by the Location Broadcaster, the Order Synchronizer and
//! the Connection Supervisor, served over HTTP and WebSocket.
//!
//! ## Data Flow
//!
//! ```text
//! vendor client ──update_location──→ Connection Supervisor
//!                                          │ owns vendor id?
//!                                          ▼
//!                                   Location Broadcaster ──save──→ store
//!                                          │
//!                                          ▼
//!                                     Room Router
//!                          ┌───────────────┴───────────────┐
//!                          ▼                               ▼
//!                 vendor-feed:global                  vendor:<id>
//!                 (every customer)                (vendor + tracking customers)
//! ```
//!
//! ## Startup Sequence
//!
//! 1. Initialize logging
//! 2. Load configuration (file, then environment), refuse the placeholder
//!    token secret
//! 3. Build the subsystem container
//! 4. Bind the HTTP listener and serve
//! 5. On Ctrl+C, stop accepting and drain within the grace period

pub mod container;

use anyhow::{Context, Result};
use cs_04_connection_supervisor::SupervisorService;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

pub use crate::container::{ConfigError, MarketConfig, MarketContainer};

/// How long open connections get to finish after shutdown is requested.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// The runtime owning the container and the shutdown signal.
pub struct MarketRuntime {
    /// Subsystem container with all initialized services.
    container: Arc<MarketContainer>,
    /// Shutdown signal sender.
    shutdown_tx: watch::Sender<bool>,
    /// Shutdown signal receiver.
    shutdown_rx: watch::Receiver<bool>,
}

impl MarketRuntime {
    pub fn new(config: MarketConfig) -> Result<Self> {
        info!("Creating Curbside market runtime");
        let container =
            Arc::new(MarketContainer::new(config).context("Failed to build subsystems")?);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Ok(Self {
            container,
            shutdown_tx,
            shutdown_rx,
        })
    }

    pub fn container(&self) -> Arc<MarketContainer> {
        Arc::clone(&self.container)
    }

    /// Bind the configured HTTP address.
    pub async fn bind(&self) -> Result<TcpListener> {
        let addr = self.container.config.supervisor.http_addr();
        TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))
    }

    /// Serve on `listener` until [`shutdown`](Self::shutdown) is called.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let service = SupervisorService::new(Arc::clone(&self.container.supervisor));
        let mut shutdown_rx = self.shutdown_rx.clone();
        let shutdown = async move {
            // An error means the sender is gone, which is a shutdown too.
            let _ = shutdown_rx.wait_for(|stop| *stop).await;
        };

        info!("===========================================");
        info!("  Curbside Market Runtime v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        service
            .run(listener, shutdown)
            .await
            .context("HTTP server failed")
    }

    /// Signal the server to stop accepting connections.
    pub fn shutdown(&self) {
        info!("Initiating graceful shutdown...");
        if self.shutdown_tx.send(true).is_err() {
            warn!("Server already stopped");
        }
    }

    /// Serve until Ctrl+C, then shut down within [`SHUTDOWN_GRACE`].
    pub async fn run_until_ctrl_c(&self, listener: TcpListener) -> Result<()> {
        let serve = self.serve(listener);
        tokio::pin!(serve);

        tokio::select! {
            result = &mut serve => return result,
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl+C")?;
                info!("Shutdown signal received");
            }
        }

        self.shutdown();
        match tokio::time::timeout(SHUTDOWN_GRACE, serve).await {
            Ok(result) => result?,
            Err(_) => warn!(
                grace_secs = SHUTDOWN_GRACE.as_secs(),
                "Connections still open after grace period, exiting"
            ),
        }
        info!("Shutdown complete");
        Ok(())
    }
}
