//! HTTP/WebSocket server

pub mod config;
pub mod listener;
pub mod transport;

pub use config::ServerConfig;
pub use listener::HubServer;
