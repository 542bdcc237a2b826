//! The pod-exec WebSocket wire protocol on top of an established
//! [`tokio_tungstenite::WebSocketStream`]: channel-byte-prefixed binary
//! frames.
//!
//! Two modes are supported: handing the raw frame stream back to the
//! caller (streaming), or collecting stdout/stderr into one ordered buffer
//! (collecting). A split-into-three-tasks design that hands back
//! `AsyncRead`/`AsyncWrite` handles would be overkill for a library that
//! doesn't also own a terminal.
use bytes::{Bytes, BytesMut};
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc::Sender;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use crate::error::ProtocolError;
use crate::{Error, Result};

/// Channel byte prefixing client-to-server stdin frames.
pub const STDIN_CHANNEL: u8 = 0;
/// Channel byte prefixing server-to-client stdout frames.
pub const STDOUT_CHANNEL: u8 = 1;
/// Channel byte prefixing server-to-client stderr frames.
pub const STDERR_CHANNEL: u8 = 2;
/// Channel byte prefixing a terminal `V1Status` error frame.
pub const ERROR_CHANNEL: u8 = 3;
/// Channel byte prefixing a terminal-resize frame.
pub const RESIZE_CHANNEL: u8 = 4;

/// A live pod-exec/attach session: an established WebSocket connection
/// speaking the `v4.channel.k8s.io` channel protocol.
pub struct ExecSession<S> {
    stream: WebSocketStream<S>,
}

impl<S> ExecSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap an already-upgraded WebSocket connection as an exec session.
    pub fn new(stream: WebSocketStream<S>) -> Self {
        Self { stream }
    }

    /// Hand back the raw channel-framed WebSocket stream for a caller that
    /// wants to drive stdin/stdout/stderr itself (streaming mode).
    pub fn into_stream(self) -> WebSocketStream<S> {
        self.stream
    }

    /// Send one outbound frame on `channel` (typically [`STDIN_CHANNEL`] or
    /// [`RESIZE_CHANNEL`]).
    pub async fn send(&mut self, channel: u8, payload: &[u8]) -> Result<()> {
        let mut frame = Vec::with_capacity(payload.len() + 1);
        frame.push(channel);
        frame.extend_from_slice(payload);
        self.stream.send(Message::Binary(frame.into())).await.map_err(|e| Error::Connection(std::io::Error::other(e)))
    }

    /// Drain the session, accumulating [`STDOUT_CHANNEL`]/[`STDERR_CHANNEL`]
    /// payloads into one ordered buffer (collecting mode); optionally fan
    /// every frame (including stdin/error/resize) out to `fan_out` as it
    /// arrives. Returns the accumulated buffer and the now-exhausted stream.
    ///
    /// A zero-length payload on any channel is skipped; it carries no data
    /// to collect or forward. A non-binary frame is a protocol violation —
    /// the pod-exec wire only ever carries binary channel frames (besides
    /// the ping/pong/close housekeeping frames tungstenite handles for us).
    pub async fn collect(mut self, fan_out: Option<Sender<(u8, Bytes)>>) -> Result<(Vec<u8>, WebSocketStream<S>)> {
        let mut buf = BytesMut::new();
        while let Some(msg) = self.stream.next().await {
            let msg = msg.map_err(|e| Error::Connection(std::io::Error::other(e)))?;
            let data = match msg {
                Message::Binary(data) => data,
                Message::Ping(_) | Message::Pong(_) => continue,
                Message::Close(_) => break,
                Message::Text(_) | Message::Frame(_) => return Err(Error::Protocol(ProtocolError::NonBinaryFrame)),
            };
            let Some((&channel, payload)) = data.split_first() else {
                continue;
            };
            if !(STDIN_CHANNEL..=RESIZE_CHANNEL).contains(&channel) {
                return Err(Error::Protocol(ProtocolError::UnknownChannel(channel)));
            }
            if payload.is_empty() {
                continue;
            }
            if let Some(tx) = &fan_out {
                let _ = tx.send((channel, Bytes::copy_from_slice(payload))).await;
            }
            if channel == STDOUT_CHANNEL || channel == STDERR_CHANNEL {
                buf.extend_from_slice(payload);
            }
        }
        Ok((buf.to_vec(), self.stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_tungstenite::tungstenite::protocol::Role;

    #[test]
    fn channel_constants_span_the_v4_protocol() {
        assert_eq!(STDIN_CHANNEL, 0);
        assert_eq!(STDOUT_CHANNEL, 1);
        assert_eq!(STDERR_CHANNEL, 2);
        assert_eq!(ERROR_CHANNEL, 3);
        assert_eq!(RESIZE_CHANNEL, 4);
    }

    #[tokio::test]
    async fn collect_concatenates_stdout_frames_and_skips_empty_payloads() {
        let (client_io, server_io) = tokio::io::duplex(4096);
        let mut server = WebSocketStream::from_raw_socket(server_io, Role::Server, None).await;
        let client = ExecSession::new(WebSocketStream::from_raw_socket(client_io, Role::Client, None).await);

        let sender = tokio::spawn(async move {
            server.send(Message::Binary(b"\x01message1 ".to_vec().into())).await.unwrap();
            server.send(Message::Binary(vec![STDOUT_CHANNEL].into())).await.unwrap();
            server.send(Message::Binary(b"\x01message2 ".to_vec().into())).await.unwrap();
            server.close(None).await.unwrap();
        });

        let (collected, _stream) = client.collect(None).await.unwrap();
        sender.await.unwrap();

        assert_eq!(collected, b"message1 message2 ");
    }

    #[tokio::test]
    async fn collect_rejects_unknown_channel_byte() {
        let (client_io, server_io) = tokio::io::duplex(4096);
        let mut server = WebSocketStream::from_raw_socket(server_io, Role::Server, None).await;
        let client = ExecSession::new(WebSocketStream::from_raw_socket(client_io, Role::Client, None).await);

        let sender = tokio::spawn(async move {
            server.send(Message::Binary(vec![9, 1].into())).await.unwrap();
        });

        let err = client.collect(None).await.unwrap_err();
        sender.await.unwrap();
        assert!(matches!(err, Error::Protocol(ProtocolError::UnknownChannel(9))));
    }
}
