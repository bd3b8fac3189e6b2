//! Outbound half of a client session

use std::fmt::Display;
use std::time::Duration;

use futures::{Sink, SinkExt};

use crate::hub::{Mailbox, Message};

/// Upper bound on the best-effort transport close
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Why the writer loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterExit {
    /// Sending to the transport failed
    SendFailed,
    /// The outbound buffer was closed and drained
    BufferClosed,
    /// The hub released the connection
    Released,
}

/// Send the welcome message, then drain the mailbox into the transport
///
/// A failed send ends the loop immediately and the message is dropped. The
/// transport is closed, best effort, only when the hub released the
/// connection; on any other exit it is left for the session to drop.
pub async fn write_loop<S, E>(mut mailbox: Mailbox, sink: S, welcome: Message) -> WriterExit
where
    S: Sink<String, Error = E>,
    E: Display,
{
    futures::pin_mut!(sink);
    let id = mailbox.id();
    let released = mailbox.released();
    let mut message = welcome;

    let exit = loop {
        match message.to_json() {
            Ok(text) => {
                let sent = tokio::select! {
                    biased;
                    _ = released.cancelled() => None,
                    sent = sink.send(text) => Some(sent),
                };
                match sent {
                    None => break WriterExit::Released,
                    Some(Err(e)) => {
                        tracing::debug!(connection_id = %id, error = %e, "Client send error");
                        break WriterExit::SendFailed;
                    }
                    Some(Ok(())) => {
                        tracing::trace!(connection_id = %id, event = %message.event, "Sent");
                    }
                }
            }
            Err(e) => {
                tracing::warn!(connection_id = %id, error = %e, "Failed to encode message");
            }
        }

        let next = tokio::select! {
            biased;
            _ = released.cancelled() => break WriterExit::Released,
            next = mailbox.recv() => next,
        };
        message = match next {
            Some(message) => message,
            None => break WriterExit::BufferClosed,
        };
    };

    if exit == WriterExit::Released
        && tokio::time::timeout(CLOSE_GRACE, sink.close()).await.is_err()
    {
        tracing::debug!(connection_id = %id, "Transport close timed out");
    }

    exit
}

#[cfg(test)]
mod tests {
    use futures::channel::mpsc;
    use futures::StreamExt;
    use tokio_test::{assert_pending, assert_ready_eq};

    use super::*;
    use crate::hub::Connection;

    fn decode(text: &str) -> Message {
        serde_json::from_str(text).unwrap()
    }

    #[tokio::test]
    async fn test_hello_then_buffered_messages() {
        let (connection, mailbox) = Connection::pair(4);
        connection.offer(Message::msg("a"));
        connection.offer(Message::msg("b"));

        let (tx, mut rx) = mpsc::unbounded::<String>();
        let welcome = Message::hello("Hello World");
        let mut task = tokio_test::task::spawn(write_loop(mailbox, tx, welcome));
        assert_pending!(task.poll());

        assert_eq!(decode(&rx.next().await.unwrap()), Message::hello("Hello World"));
        assert_eq!(decode(&rx.next().await.unwrap()), Message::msg("a"));
        assert_eq!(decode(&rx.next().await.unwrap()), Message::msg("b"));

        connection.offer(Message::ping());
        assert!(task.is_woken());
        assert_pending!(task.poll());
        assert_eq!(decode(&rx.next().await.unwrap()), Message::ping());

        connection.release();
        assert!(task.is_woken());
        assert_ready_eq!(task.poll(), WriterExit::Released);

        // Transport closed after exit
        assert_eq!(rx.next().await, None);
    }

    #[tokio::test]
    async fn test_send_failure_exits() {
        let (connection, mailbox) = Connection::pair(4);
        connection.offer(Message::msg("dropped"));

        let (tx, rx) = mpsc::unbounded::<String>();
        drop(rx);

        let exit = write_loop(mailbox, tx, Message::hello("Hello World")).await;
        assert_eq!(exit, WriterExit::SendFailed);
    }

    #[tokio::test]
    async fn test_buffer_closed_exits() {
        let (connection, mailbox) = Connection::pair(4);
        connection.offer(Message::msg("last"));
        drop(connection);

        let (mut tx, rx) = mpsc::unbounded::<String>();
        let exit = write_loop(mailbox, &mut tx, Message::hello("Hello World")).await;

        assert_eq!(exit, WriterExit::BufferClosed);
        // Not released, so the transport is left open
        assert!(!tx.is_closed());

        drop(tx);
        let sent: Vec<String> = rx.collect().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(decode(&sent[1]), Message::msg("last"));
    }

    #[tokio::test]
    async fn test_release_closes_transport() {
        let (connection, mailbox) = Connection::pair(4);
        connection.release();

        let (mut tx, _rx) = mpsc::unbounded::<String>();
        let exit = write_loop(mailbox, &mut tx, Message::hello("Hello World")).await;

        assert_eq!(exit, WriterExit::Released);
        assert!(tx.is_closed());
    }
}
