//! Statistics for the hub

use std::time::{Duration, Instant};

/// Snapshot of hub counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HubStats {
    /// Connections currently in the set
    pub active: u64,
    /// Total connections ever registered
    pub registered: u64,
    /// Connections removed by an explicit unregister
    pub unregistered: u64,
    /// Connections evicted during fan-out (full or closed buffer)
    pub evicted: u64,
    /// Unregisters for connections that were already gone
    pub redundant_unregisters: u64,
    /// Broadcasts processed
    pub broadcasts: u64,
    /// Messages successfully queued to connections
    pub deliveries: u64,
    /// Time since the hub was created
    pub uptime: Duration,
}

impl HubStats {
    /// Create zeroed stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Connections released for any reason
    pub fn released(&self) -> u64 {
        self.unregistered + self.evicted
    }

    /// Average recipients per broadcast
    pub fn fanout_ratio(&self) -> f64 {
        if self.broadcasts > 0 {
            self.deliveries as f64 / self.broadcasts as f64
        } else {
            0.0
        }
    }
}

/// Running counters owned by the hub loop
#[derive(Debug, Clone)]
pub(crate) struct HubCounters {
    started_at: Instant,
    pub registered: u64,
    pub unregistered: u64,
    pub evicted: u64,
    pub redundant_unregisters: u64,
    pub broadcasts: u64,
    pub deliveries: u64,
}

impl HubCounters {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            registered: 0,
            unregistered: 0,
            evicted: 0,
            redundant_unregisters: 0,
            broadcasts: 0,
            deliveries: 0,
        }
    }

    /// Take a snapshot with the current set size
    pub fn snapshot(&self, active: usize) -> HubStats {
        HubStats {
            active: active as u64,
            registered: self.registered,
            unregistered: self.unregistered,
            evicted: self.evicted,
            redundant_unregisters: self.redundant_unregisters,
            broadcasts: self.broadcasts,
            deliveries: self.deliveries,
            uptime: self.started_at.elapsed(),
        }
    }
}
