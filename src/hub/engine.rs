//! Hub event loop
//!
//! The hub task is the only place the connection set is touched. Everything
//! else talks to it through a [`HubHandle`], which submits commands over a
//! single bounded channel. Commands are applied one at a time in arrival
//! order, so a broadcast is never interleaved with another broadcast or with
//! a membership change.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::stats::{HubCounters, HubStats};

use super::config::HubConfig;
use super::connection::{Connection, ConnectionId, Mailbox, Offer};
use super::message::Message;

/// Commands accepted by the hub loop
#[derive(Debug)]
enum Command {
    Register(Connection),
    Unregister(ConnectionId),
    Broadcast(Message),
    Stats(oneshot::Sender<HubStats>),
}

/// Why a connection left the set
#[derive(Debug, Clone, Copy)]
enum Removal {
    Unregistered,
    SlowConsumer,
    WriterGone,
    Shutdown,
}

/// The fan-out hub
///
/// Owns the connection set. Run it with [`Hub::run`] on its own task.
pub struct Hub {
    connections: HashMap<ConnectionId, Connection>,
    commands: mpsc::Receiver<Command>,
    counters: HubCounters,
}

impl Hub {
    /// Create a hub and the handle used to reach it
    pub fn new(config: HubConfig) -> (Self, HubHandle) {
        let (tx, rx) = mpsc::channel(config.intake_capacity.max(1));

        let hub = Self {
            connections: HashMap::new(),
            commands: rx,
            counters: HubCounters::new(),
        };
        let handle = HubHandle {
            commands: tx,
            config: Arc::new(config),
        };

        (hub, handle)
    }

    /// Create a hub and spawn its loop
    ///
    /// The loop stops when `shutdown` is cancelled or every handle is dropped.
    pub fn spawn(config: HubConfig, shutdown: CancellationToken) -> (HubHandle, JoinHandle<()>) {
        let (hub, handle) = Self::new(config);
        let task = tokio::spawn(hub.run(shutdown));
        (handle, task)
    }

    /// Process commands until shutdown
    ///
    /// On exit every remaining connection is released, which ends its reader
    /// and writer loops. That includes connections whose registration was
    /// still waiting in the intake.
    pub async fn run(mut self, shutdown: CancellationToken) {
        tracing::debug!("Hub started");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    tracing::debug!("Hub shutdown requested");
                    break;
                }
                command = self.commands.recv() => match command {
                    Some(command) => self.apply(command),
                    None => break,
                },
            }
        }

        let ids: Vec<ConnectionId> = self.connections.keys().copied().collect();
        for id in ids {
            self.remove(id, Removal::Shutdown);
        }

        self.commands.close();
        while let Ok(command) = self.commands.try_recv() {
            if let Command::Register(connection) = command {
                let id = connection.id();
                connection.release();
                tracing::debug!(connection_id = %id, "Released pending registration");
            }
        }

        let stats = self.counters.snapshot(0);
        tracing::info!(
            registered = stats.registered,
            evicted = stats.evicted,
            broadcasts = stats.broadcasts,
            deliveries = stats.deliveries,
            "Hub stopped"
        );
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Register(connection) => self.register(connection),
            Command::Unregister(id) => self.unregister(id),
            Command::Broadcast(message) => self.broadcast(message),
            Command::Stats(reply) => {
                let _ = reply.send(self.counters.snapshot(self.connections.len()));
            }
        }
    }

    fn register(&mut self, connection: Connection) {
        let id = connection.id();
        self.connections.insert(id, connection);
        self.counters.registered += 1;

        tracing::info!(
            connection_id = %id,
            active = self.connections.len(),
            "New connection"
        );
    }

    fn unregister(&mut self, id: ConnectionId) {
        if !self.remove(id, Removal::Unregistered) {
            // Already evicted by a broadcast
            self.counters.redundant_unregisters += 1;
            tracing::trace!(connection_id = %id, "Unregister for unknown connection");
        }
    }

    /// Offer the message to every connection; evict the ones that cannot take it
    fn broadcast(&mut self, message: Message) {
        self.counters.broadcasts += 1;

        let mut dead = Vec::new();
        for (id, connection) in &self.connections {
            match connection.offer(message.clone()) {
                Offer::Queued => self.counters.deliveries += 1,
                Offer::Full => dead.push((*id, Removal::SlowConsumer)),
                Offer::Closed => dead.push((*id, Removal::WriterGone)),
            }
        }

        for (id, reason) in dead {
            self.remove(id, reason);
        }

        tracing::trace!(
            event = %message.event,
            recipients = self.connections.len(),
            "Broadcast"
        );
    }

    /// Take a connection out of the set and release it
    ///
    /// Returns false if it was not a member. Release happens only after
    /// removal, and removal happens at most once per connection.
    fn remove(&mut self, id: ConnectionId, reason: Removal) -> bool {
        let Some(connection) = self.connections.remove(&id) else {
            return false;
        };
        connection.release();

        let active = self.connections.len();
        match reason {
            Removal::Unregistered => {
                self.counters.unregistered += 1;
                tracing::info!(connection_id = %id, active, "Unregister connection");
            }
            Removal::SlowConsumer | Removal::WriterGone => {
                self.counters.evicted += 1;
                tracing::info!(connection_id = %id, active, reason = ?reason, "Closed connection");
            }
            Removal::Shutdown => {
                tracing::debug!(connection_id = %id, "Released on shutdown");
            }
        }

        true
    }
}

/// Cloneable handle for submitting commands to the hub
#[derive(Debug, Clone)]
pub struct HubHandle {
    commands: mpsc::Sender<Command>,
    config: Arc<HubConfig>,
}

impl HubHandle {
    /// Configuration the hub was created with
    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Add a connection to the set
    pub async fn register(&self, connection: Connection) -> Result<()> {
        self.submit(Command::Register(connection)).await
    }

    /// Remove a connection from the set
    ///
    /// A no-op if the connection was already removed.
    pub async fn unregister(&self, id: ConnectionId) -> Result<()> {
        self.submit(Command::Unregister(id)).await
    }

    /// Fan a message out to every connection
    ///
    /// Waits only for intake space in the hub, never for a recipient.
    pub async fn broadcast(&self, message: Message) -> Result<()> {
        self.submit(Command::Broadcast(message)).await
    }

    /// Create a connection sized by the hub config and register it
    pub async fn open(&self) -> Result<Mailbox> {
        let (connection, mailbox) = Connection::pair(self.config.outbound_capacity);
        self.register(connection).await?;
        Ok(mailbox)
    }

    /// Snapshot the hub counters
    ///
    /// The reply is produced after every command submitted before it.
    pub async fn stats(&self) -> Result<HubStats> {
        let (tx, rx) = oneshot::channel();
        self.submit(Command::Stats(tx)).await?;
        rx.await.map_err(|_| Error::HubClosed)
    }

    /// Whether the hub loop has stopped
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    async fn submit(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| Error::HubClosed)
    }
}
