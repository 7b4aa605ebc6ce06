//! Connection Supervisor service: binds the HTTP listener and serves the
//! router until shutdown.

use axum::Router;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::domain::SupervisorError;
use crate::http;
use crate::supervisor::ConnectionSupervisor;

pub struct SupervisorService {
    supervisor: Arc<ConnectionSupervisor>,
}

impl SupervisorService {
    pub fn new(supervisor: Arc<ConnectionSupervisor>) -> Self {
        Self { supervisor }
    }

    pub fn supervisor(&self) -> &Arc<ConnectionSupervisor> {
        &self.supervisor
    }

    pub fn router(&self) -> Router {
        http::router(Arc::clone(&self.supervisor))
    }

    /// Bind the configured HTTP address.
    pub async fn bind(&self) -> Result<TcpListener, SupervisorError> {
        let addr = self.supervisor.config().http_addr();
        Ok(TcpListener::bind(addr).await?)
    }

    /// Serve until `shutdown` resolves, then stop accepting connections.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), SupervisorError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        info!(addr = %addr, "Connection supervisor listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Connection supervisor stopped");
        Ok(())
    }
}
