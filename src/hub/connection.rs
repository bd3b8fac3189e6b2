//! Per-client connection state
//!
//! A connection is split in two when it is created: the [`Connection`] that
//! the hub keeps in its set, and the [`Mailbox`] that the client's writer
//! loop drains. The halves share only the outbound channel and a release
//! token.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::message::Message;

/// Opaque identity of a connection, used for logging and as the set key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Generate a fresh random identity
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of a non-blocking enqueue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    /// Message queued for the writer
    Queued,
    /// Buffer full: the consumer is too slow
    Full,
    /// Writer side already gone
    Closed,
}

/// Hub-side half of a connection
///
/// Owned by the hub's connection set. Dropping the sender closes the
/// outbound buffer, so removing the entry from the set and calling
/// [`Connection::release`] closes it exactly once.
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    outbound: mpsc::Sender<Message>,
    release: CancellationToken,
}

impl Connection {
    /// Create a connection with a bounded outbound buffer
    ///
    /// Returns the hub-side half and the client-side mailbox.
    pub fn pair(capacity: usize) -> (Self, Mailbox) {
        let id = ConnectionId::new();
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let release = CancellationToken::new();

        let connection = Self {
            id,
            outbound: tx,
            release: release.clone(),
        };
        let mailbox = Mailbox {
            id,
            inbox: rx,
            released: release,
        };

        (connection, mailbox)
    }

    /// Connection identity
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Try to queue a message without waiting
    pub fn offer(&self, message: Message) -> Offer {
        match self.outbound.try_send(message) {
            Ok(()) => Offer::Queued,
            Err(TrySendError::Full(_)) => Offer::Full,
            Err(TrySendError::Closed(_)) => Offer::Closed,
        }
    }

    /// Close the outbound buffer and signal the transport to shut down
    ///
    /// The transport close itself happens on the connection's own tasks;
    /// this never waits for it.
    pub fn release(self) {
        self.release.cancel();
        drop(self.outbound);
    }
}

/// Client-side half of a connection
#[derive(Debug)]
pub struct Mailbox {
    id: ConnectionId,
    inbox: mpsc::Receiver<Message>,
    released: CancellationToken,
}

impl Mailbox {
    /// Identity of the owning connection
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Token cancelled once the hub has released the connection
    pub fn released(&self) -> CancellationToken {
        self.released.clone()
    }

    /// Whether the hub has released the connection
    pub fn is_released(&self) -> bool {
        self.released.is_cancelled()
    }

    /// Wait for the next queued message
    ///
    /// Returns `None` once the buffer is closed and drained.
    pub async fn recv(&mut self) -> Option<Message> {
        self.inbox.recv().await
    }

    /// Take a queued message without waiting
    pub fn try_recv(&mut self) -> Option<Message> {
        self.inbox.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let (a, _) = Connection::pair(1);
        let (b, _) = Connection::pair(1);

        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_pair_shares_id() {
        let (connection, mailbox) = Connection::pair(1);
        assert_eq!(connection.id(), mailbox.id());
    }

    #[test]
    fn test_offer_until_full() {
        let (connection, mut mailbox) = Connection::pair(1);

        assert_eq!(connection.offer(Message::ping()), Offer::Queued);
        assert_eq!(connection.offer(Message::ping()), Offer::Full);

        assert_eq!(mailbox.try_recv(), Some(Message::ping()));
        assert_eq!(connection.offer(Message::msg("x")), Offer::Queued);
    }

    #[test]
    fn test_offer_after_mailbox_dropped() {
        let (connection, mailbox) = Connection::pair(4);
        drop(mailbox);

        assert_eq!(connection.offer(Message::ping()), Offer::Closed);
    }

    #[tokio::test]
    async fn test_release_closes_buffer_and_signals() {
        let (connection, mut mailbox) = Connection::pair(2);
        connection.offer(Message::msg("queued"));

        assert!(!mailbox.is_released());
        connection.release();

        assert!(mailbox.is_released());
        // Already-queued messages are still drained before the close is seen
        assert_eq!(mailbox.recv().await, Some(Message::msg("queued")));
        assert_eq!(mailbox.recv().await, None);
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let (connection, _mailbox) = Connection::pair(0);
        assert_eq!(connection.offer(Message::ping()), Offer::Queued);
    }
}
