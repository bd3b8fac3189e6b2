//! Per-client session handling
//!
//! A session ties one client transport to the hub:
//!
//! 1. Open a connection (identity + outbound buffer) and register it
//! 2. Spawn the writer loop (welcome, then drain the buffer)
//! 3. Run the reader loop until the client goes away
//! 4. Unregister
//!
//! The connection is live exactly as long as its reader loop runs.

pub mod reader;
pub mod writer;

use std::fmt::Display;

use futures::{Sink, Stream};

use crate::hub::{HubHandle, Message};

pub use reader::{read_loop, ReaderExit};
pub use writer::{write_loop, WriterExit};

/// Run one client session to completion
///
/// `stream` yields inbound text, `sink` accepts outbound JSON text. Both are
/// owned by the session and dropped when it ends.
pub async fn run_session<St, Si, RE, WE>(hub: HubHandle, stream: St, sink: Si)
where
    St: Stream<Item = Result<String, RE>>,
    RE: Display,
    Si: Sink<String, Error = WE> + Send + 'static,
    WE: Display + Send + 'static,
{
    let mailbox = match hub.open().await {
        Ok(mailbox) => mailbox,
        Err(e) => {
            tracing::warn!(error = %e, "Rejecting client");
            return;
        }
    };
    let id = mailbox.id();
    let released = mailbox.released();

    let welcome = Message::hello(&*hub.config().welcome);
    let writer = tokio::spawn(write_loop(mailbox, sink, welcome));

    let exit = read_loop(id, stream, &hub, released).await;
    tracing::debug!(connection_id = %id, exit = ?exit, "Reader finished");

    // No-op if a broadcast already evicted this connection
    if let Err(e) = hub.unregister(id).await {
        tracing::debug!(connection_id = %id, error = %e, "Unregister skipped");
    }

    match writer.await {
        Ok(exit) => tracing::debug!(connection_id = %id, exit = ?exit, "Writer finished"),
        Err(e) => tracing::warn!(connection_id = %id, error = %e, "Writer task failed"),
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::time::Duration;

    use futures::channel::mpsc;
    use futures::StreamExt;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::hub::{EventKind, Hub, HubConfig};

    fn decode(text: &str) -> Message {
        serde_json::from_str(text).unwrap()
    }

    struct TestClient {
        inbound: mpsc::UnboundedSender<Result<String, Infallible>>,
        outbound: mpsc::UnboundedReceiver<String>,
        session: tokio::task::JoinHandle<()>,
    }

    impl TestClient {
        fn connect(hub: &HubHandle) -> Self {
            let (in_tx, in_rx) = mpsc::unbounded();
            let (out_tx, out_rx) = mpsc::unbounded();
            let session = tokio::spawn(run_session(hub.clone(), in_rx, out_tx));

            Self {
                inbound: in_tx,
                outbound: out_rx,
                session,
            }
        }

        fn say(&self, text: &str) {
            self.inbound.unbounded_send(Ok(text.to_string())).unwrap();
        }

        async fn next(&mut self) -> Option<Message> {
            self.outbound.next().await.map(|text| decode(&text))
        }
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let (hub, _task) = Hub::spawn(HubConfig::default(), CancellationToken::new());
        let mut client = TestClient::connect(&hub);

        assert_eq!(client.next().await, Some(Message::hello("Hello World")));
        assert_eq!(hub.stats().await.unwrap().active, 1);

        client.say("hi");
        assert_eq!(client.next().await, Some(Message::msg("hi")));

        drop(client.inbound);
        tokio::time::timeout(Duration::from_secs(1), client.session)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(client.outbound.next().await, None);
        let stats = hub.stats().await.unwrap();
        assert_eq!(stats.active, 0);
        assert_eq!(stats.unregistered, 1);
    }

    #[tokio::test]
    async fn test_two_clients_share_broadcasts() {
        let (hub, _task) = Hub::spawn(HubConfig::default(), CancellationToken::new());

        let mut a = TestClient::connect(&hub);
        let mut b = TestClient::connect(&hub);
        assert_eq!(a.next().await.unwrap().event, EventKind::Hello);
        assert_eq!(b.next().await.unwrap().event, EventKind::Hello);

        // Both registered before anyone speaks
        while hub.stats().await.unwrap().active < 2 {
            tokio::task::yield_now().await;
        }

        a.say("hi");
        assert_eq!(a.next().await, Some(Message::msg("hi")));
        assert_eq!(b.next().await, Some(Message::msg("hi")));

        drop(a.inbound);
        a.session.await.unwrap();

        b.say("still here");
        assert_eq!(b.next().await, Some(Message::msg("still here")));
        assert_eq!(a.outbound.next().await, None);
        assert_eq!(hub.stats().await.unwrap().active, 1);
    }

    #[tokio::test]
    async fn test_hub_shutdown_ends_session() {
        let shutdown = CancellationToken::new();
        let (hub, _task) = Hub::spawn(HubConfig::default(), shutdown.clone());
        let mut client = TestClient::connect(&hub);

        assert_eq!(client.next().await.unwrap().event, EventKind::Hello);
        shutdown.cancel();

        tokio::time::timeout(Duration::from_secs(1), client.session)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(client.outbound.next().await, None);
    }

    #[tokio::test]
    async fn test_rejected_when_hub_closed() {
        let shutdown = CancellationToken::new();
        let (hub, task) = Hub::spawn(HubConfig::default(), shutdown.clone());
        shutdown.cancel();
        task.await.unwrap();

        let mut client = TestClient::connect(&hub);
        client.session.await.unwrap();

        assert_eq!(client.outbound.next().await, None);
    }
}
