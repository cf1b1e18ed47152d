//! The duplex transport contract and its axum implementation.
//!
//! A connection needs only two halves: one it can `receive` text from and
//! one it can `send` text to and finally `close`. The halves are owned by
//! different pumps, so they are separate traits.

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tracing::debug;

use crate::errors::TransportError;

/// Receive half of a client transport.
#[async_trait]
pub trait MessageStream: Send + 'static {
    /// Wait for the next text message. `Ok(None)` means the peer closed cleanly.
    async fn receive(&mut self) -> Result<Option<String>, TransportError>;
}

/// Send half of a client transport.
#[async_trait]
pub trait MessageSink: Send + 'static {
    /// Write one text message.
    async fn send(&mut self, text: String) -> Result<(), TransportError>;

    /// Close the transport.
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Receive half of an axum WebSocket.
pub struct WsReceiver(SplitStream<WebSocket>);

/// Send half of an axum WebSocket.
pub struct WsSender(SplitSink<WebSocket, Message>);

/// Split an upgraded socket into its receive and send halves.
pub fn split_socket(socket: WebSocket) -> (WsReceiver, WsSender) {
    let (sink, stream) = socket.split();
    (WsReceiver(stream), WsSender(sink))
}

#[async_trait]
impl MessageStream for WsReceiver {
    async fn receive(&mut self) -> Result<Option<String>, TransportError> {
        while let Some(frame) = self.0.next().await {
            match frame? {
                Message::Text(text) => return Ok(Some(text.as_str().to_owned())),
                // Some clients send JSON in binary frames
                Message::Binary(data) => match std::str::from_utf8(&data) {
                    Ok(text) => return Ok(Some(text.to_owned())),
                    Err(_) => debug!(len = data.len(), "skipping non-UTF8 binary frame"),
                },
                Message::Close(_) => return Ok(None),
                // axum answers pings itself
                Message::Ping(_) | Message::Pong(_) => {}
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl MessageSink for WsSender {
    async fn send(&mut self, text: String) -> Result<(), TransportError> {
        self.0.send(Message::Text(text.into())).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.0.close().await?;
        Ok(())
    }
}
