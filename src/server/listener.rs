//! Hub server listener
//!
//! Binds the HTTP listener, starts the hub and heartbeat tasks, and routes
//! WebSocket upgrades into sessions. Every other path is a static file.

use std::future::Future;
use std::net::SocketAddr;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::error::{Error, Result};
use crate::hub::{spawn_heartbeat, Hub, HubHandle};
use crate::server::config::ServerConfig;
use crate::server::transport;
use crate::session;

/// Fan-out hub server
pub struct HubServer {
    config: ServerConfig,
    hub: Hub,
    handle: HubHandle,
}

impl HubServer {
    /// Create a new server with the given configuration
    ///
    /// The hub is created immediately but only starts processing once the
    /// server runs.
    pub fn new(config: ServerConfig) -> Self {
        let (hub, handle) = Hub::new(config.hub.clone());

        Self {
            config,
            hub,
            handle,
        }
    }

    /// Get a handle to the hub
    pub fn hub(&self) -> &HubHandle {
        &self.handle
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Build the HTTP router
    pub fn router(&self) -> Router {
        Router::new()
            .route(&self.config.ws_path, get(upgrade))
            .fallback_service(ServeDir::new(&self.config.static_root))
            .with_state(self.handle.clone())
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server
    ///
    /// Runs until the process is killed. Fails only if the listener cannot
    /// bind.
    pub async fn run(self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.bind_addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| Error::Bind { addr, source })?;

        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    ///
    /// On shutdown the heartbeat stops and the hub releases every connection
    /// before this returns.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local_addr = listener.local_addr()?;
        tracing::info!(
            addr = %local_addr,
            path = %self.config.ws_path,
            root = %self.config.static_root.display(),
            "Hub server listening"
        );

        let router = self.router();
        let stop = CancellationToken::new();

        let hub_task = tokio::spawn(self.hub.run(stop.clone()));
        let heartbeat = spawn_heartbeat(self.handle.clone(), stop.clone());

        let signal = stop.clone();
        let result = axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown => tracing::info!("Shutdown signal received"),
                    _ = signal.cancelled() => {}
                }
                signal.cancel();
            })
            .await;

        stop.cancel();
        if let Err(e) = heartbeat.await {
            tracing::warn!(error = %e, "Heartbeat task failed");
        }
        if let Err(e) = hub_task.await {
            tracing::warn!(error = %e, "Hub task failed");
        }

        result.map_err(Error::from)
    }
}

/// Upgrade the request and run a session on the socket
async fn upgrade(ws: WebSocketUpgrade, State(hub): State<HubHandle>) -> Response {
    ws.on_upgrade(move |socket| async move {
        let (inbound, outbound) = transport::split(socket);
        session::run_session(hub, inbound, outbound).await;
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_bind_failure_is_fatal() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap();

        let server = HubServer::new(ServerConfig::with_addr(addr));
        let result = server.run_until(std::future::pending()).await;

        assert!(matches!(result, Err(Error::Bind { addr: a, .. }) if a == addr));
    }

    #[tokio::test]
    async fn test_shutdown_stops_hub() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let server = HubServer::new(ServerConfig::default());
        let hub = server.hub().clone();

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let task = tokio::spawn(server.serve(listener, async move {
            let _ = rx.await;
        }));

        hub.stats().await.unwrap();
        tx.send(()).unwrap();

        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert!(hub.is_closed());
    }
}
