//! Wire message types
//!
//! Every server-to-client frame is a flat `{"event": ..., "data": ...}`
//! object. Chat text, the welcome greeting and heartbeats share this shape.

use serde::{Deserialize, Serialize};

/// Tag carried in the `event` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// One-time greeting sent to a newly connected client
    Hello,
    /// Text relayed from a client
    Msg,
    /// Periodic heartbeat
    Ping,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            EventKind::Hello => "hello",
            EventKind::Msg => "msg",
            EventKind::Ping => "ping",
        };
        f.write_str(tag)
    }
}

/// A message fanned out to connections
///
/// Cloned once per recipient during broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Event tag
    pub event: EventKind,
    /// Payload (empty for heartbeats)
    pub data: String,
}

impl Message {
    /// Create a welcome message
    pub fn hello(data: impl Into<String>) -> Self {
        Self {
            event: EventKind::Hello,
            data: data.into(),
        }
    }

    /// Wrap client text for fan-out
    pub fn msg(data: impl Into<String>) -> Self {
        Self {
            event: EventKind::Msg,
            data: data.into(),
        }
    }

    /// Create a heartbeat
    pub fn ping() -> Self {
        Self {
            event: EventKind::Ping,
            data: String::new(),
        }
    }

    /// Encode as a JSON text frame
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
