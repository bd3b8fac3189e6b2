//! Error types
//!
//! Only bootstrap and handle operations can fail. Per-connection transport
//! errors never leave the loop that observed them.

use std::net::SocketAddr;

/// Result type alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the hub server
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The listener could not bind its address
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// I/O error while serving
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The hub task has stopped and no longer accepts commands
    #[error("hub is no longer running")]
    HubClosed,

    /// A message could not be encoded for the wire
    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}
