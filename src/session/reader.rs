//! Inbound half of a client session

use std::fmt::Display;

use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::hub::{ConnectionId, HubHandle, Message};

/// Why the reader loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderExit {
    /// The client closed the transport
    Closed,
    /// The transport reported an error
    TransportError,
    /// The hub released the connection
    Released,
    /// The hub is no longer running
    HubClosed,
}

/// Forward every inbound text message to the hub as a `msg` broadcast
///
/// Runs until the transport ends or fails, or until the hub releases the
/// connection. Unregistering is left to the caller.
pub async fn read_loop<S, E>(
    id: ConnectionId,
    stream: S,
    hub: &HubHandle,
    released: CancellationToken,
) -> ReaderExit
where
    S: Stream<Item = Result<String, E>>,
    E: Display,
{
    futures::pin_mut!(stream);

    loop {
        let next = tokio::select! {
            _ = released.cancelled() => return ReaderExit::Released,
            next = stream.next() => next,
        };

        match next {
            Some(Ok(text)) => {
                tracing::trace!(connection_id = %id, len = text.len(), "Recv");

                if hub.broadcast(Message::msg(text)).await.is_err() {
                    return ReaderExit::HubClosed;
                }
            }
            Some(Err(e)) => {
                tracing::debug!(connection_id = %id, error = %e, "Client reader error");
                return ReaderExit::TransportError;
            }
            None => return ReaderExit::Closed,
        }
    }
}
