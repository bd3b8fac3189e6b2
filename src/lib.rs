//! WebSocket fan-out hub
//!
//! Clients connect over a WebSocket, send text, and receive every message
//! broadcast to all connected clients plus a periodic heartbeat.
//!
//! # Overview
//!
//! - [`hub`]: the connection set and the single loop that applies
//!   register/unregister/broadcast, with slow-consumer eviction
//! - [`session`]: per-client reader and writer loops
//! - [`server`]: HTTP listener, WebSocket upgrade, static files
//!
//! # Example
//!
//! ```no_run
//! use fanout_rs::{HubServer, ServerConfig};
//!
//! # async fn example() -> fanout_rs::Result<()> {
//! let config = ServerConfig::with_addr("127.0.0.1:8080".parse().unwrap());
//! let server = HubServer::new(config);
//!
//! server
//!     .run_until(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await
//! # }
//! ```

pub mod error;
pub mod hub;
pub mod server;
pub mod session;
pub mod stats;

pub use error::{Error, Result};
pub use hub::{HubConfig, HubHandle, Message};
pub use server::{HubServer, ServerConfig};
pub use stats::HubStats;
