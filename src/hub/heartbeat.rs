//! Heartbeat generator
//!
//! Broadcasts a `ping` on a fixed interval for as long as the server runs.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::engine::HubHandle;
use super::message::Message;

/// Shortest accepted period; tokio rejects a zero interval
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Broadcast pings every `interval` until `shutdown` fires or the hub stops
///
/// The first ping goes out immediately. Ticks are neither jittered nor
/// skipped; if the hub intake is full the ping waits for room.
pub async fn run_heartbeat(hub: HubHandle, interval: Duration, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval(interval.max(MIN_INTERVAL));

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let sent = tokio::select! {
            _ = shutdown.cancelled() => break,
            sent = hub.broadcast(Message::ping()) => sent,
        };
        if sent.is_err() {
            tracing::debug!("Hub closed, stopping heartbeat");
            break;
        }
    }
}

/// Spawn the heartbeat task using the hub's configured interval
pub fn spawn_heartbeat(hub: HubHandle, shutdown: CancellationToken) -> JoinHandle<()> {
    let interval = hub.config().heartbeat_interval;
    tokio::spawn(run_heartbeat(hub, interval, shutdown))
}
