//! Hub configuration

use std::sync::Arc;
use std::time::Duration;

/// Default outbound buffer size per connection
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 8;

/// Default size of the hub's command intake
pub const DEFAULT_INTAKE_CAPACITY: usize = 64;

/// Default heartbeat period
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

/// Default greeting carried by the `hello` message
pub const DEFAULT_WELCOME: &str = "Hello World";

/// Hub configuration options
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Messages a connection may have queued before it is evicted as a slow
    /// consumer. Kept small: the queue decouples fan-out from the writer, it
    /// is not a delivery guarantee.
    pub outbound_capacity: usize,

    /// Commands that may wait for the hub loop before submitters are suspended
    pub intake_capacity: usize,

    /// Interval between heartbeat pings
    pub heartbeat_interval: Duration,

    /// Payload of the welcome message
    pub welcome: Arc<str>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
            intake_capacity: DEFAULT_INTAKE_CAPACITY,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            welcome: Arc::from(DEFAULT_WELCOME),
        }
    }
}

impl HubConfig {
    /// Set the per-connection outbound buffer size (minimum 1)
    pub fn outbound_capacity(mut self, capacity: usize) -> Self {
        self.outbound_capacity = capacity.max(1);
        self
    }

    /// Set the command intake size (minimum 1)
    pub fn intake_capacity(mut self, capacity: usize) -> Self {
        self.intake_capacity = capacity.max(1);
        self
    }

    /// Set the heartbeat interval
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Set the welcome payload
    pub fn welcome(mut self, text: impl Into<Arc<str>>) -> Self {
        self.welcome = text.into();
        self
    }
}
