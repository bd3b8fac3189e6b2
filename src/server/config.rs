//! Server configuration

use std::net::{Ipv6Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::hub::HubConfig;

/// Default listening port
pub const DEFAULT_PORT: u16 = 8080;

/// Default WebSocket endpoint
pub const DEFAULT_WS_PATH: &str = "/echo";

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Path that upgrades to a WebSocket session
    pub ws_path: String,

    /// Directory served for every other path
    pub static_root: PathBuf,

    /// Hub settings
    pub hub: HubConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv6Addr::UNSPECIFIED, DEFAULT_PORT)),
            ws_path: DEFAULT_WS_PATH.to_string(),
            static_root: PathBuf::from("."),
            hub: HubConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the WebSocket endpoint path
    ///
    /// A missing leading slash is added.
    pub fn ws_path(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.ws_path = if path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        };
        self
    }

    /// Set the static file directory
    pub fn static_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.static_root = root.into();
        self
    }

    /// Replace the hub settings
    pub fn hub(mut self, hub: HubConfig) -> Self {
        self.hub = hub;
        self
    }

    /// Set the heartbeat interval
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.hub = self.hub.heartbeat_interval(interval);
        self
    }

    /// Set the per-connection outbound buffer size
    pub fn outbound_capacity(mut self, capacity: usize) -> Self {
        self.hub = self.hub.outbound_capacity(capacity);
        self
    }
}
