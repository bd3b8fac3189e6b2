//! WebSocket transport adapter
//!
//! Splits an upgraded socket into the text stream and text sink that a
//! session works with. Frame handling:
//!
//! - text frames pass through
//! - binary frames are decoded as lossy UTF-8
//! - ping/pong frames are skipped (axum answers pings itself)
//! - a close frame ends the stream

use axum::extract::ws::{Message as WsMessage, WebSocket};
use futures::future;
use futures::{Sink, SinkExt, Stream, StreamExt, TryStreamExt};

/// Split a WebSocket into `(inbound text, outbound text)`
pub fn split(
    socket: WebSocket,
) -> (
    impl Stream<Item = Result<String, axum::Error>> + Send,
    impl Sink<String, Error = axum::Error> + Send,
) {
    let (sink, stream) = socket.split();

    let inbound = stream
        .take_while(|frame| future::ready(!matches!(frame, Ok(WsMessage::Close(_)))))
        .try_filter_map(|frame| future::ready(Ok(frame_text(frame))));

    let outbound =
        sink.with(|text: String| future::ready(Ok::<_, axum::Error>(WsMessage::Text(text))));

    (inbound, outbound)
}

/// Extract application text from a frame, if it carries any
fn frame_text(frame: WsMessage) -> Option<String> {
    match frame {
        WsMessage::Text(text) => Some(text),
        WsMessage::Binary(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Close(_) => None,
    }
}
