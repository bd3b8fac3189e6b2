//! Connection hub for message fan-out
//!
//! The hub owns the set of live connections and is the single point where
//! membership changes and broadcasts are applied. Other tasks reach it only
//! through a [`HubHandle`].
//!
//! # Architecture
//!
//! ```text
//!   [Reader]  [Reader]  [Heartbeat]
//!       │         │          │
//!       └─────────┼──────────┘
//!                 ▼
//!      HubHandle ─► mpsc<Command> ─► Hub task
//!                               ┌──────────────────────┐
//!                               │ connections: HashMap │
//!                               │   <Id, Connection>   │
//!                               └──────────┬───────────┘
//!                       try_send per connection (never waits)
//!                 ┌────────────────────────┼────────────────────────┐
//!                 ▼                        ▼                        ▼
//!            [Mailbox]                [Mailbox]                [Mailbox]
//!             Writer ──► WebSocket     Writer ──► WebSocket     Writer ──► WebSocket
//! ```
//!
//! # Backpressure
//!
//! Each connection has a small bounded buffer. When a broadcast finds it
//! full, the connection is evicted on the spot: removed from the set, its
//! buffer closed, its transport told to shut down. A slow client is
//! disconnected rather than slowing down everyone else.

pub mod config;
pub mod connection;
pub mod engine;
pub mod heartbeat;
pub mod message;

pub use config::HubConfig;
pub use connection::{Connection, ConnectionId, Mailbox, Offer};
pub use engine::{Hub, HubHandle};
pub use heartbeat::{run_heartbeat, spawn_heartbeat};
pub use message::{EventKind, Message};
