//! WebSocket transport for the client.
//!
//! Provides [`ConnectedChannel`], which speaks Engine.IO v4 / Socket.IO v4 over
//! a single WebSocket. This layer only moves packets: it completes the
//! handshake, answers heartbeats and forwards event packets as raw text.
//! Protocol logic remains in the Sans-IO [`crate::Client`].

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parley_proto::{EnginePacket, OutboundEvent, SocketPacket};
use thiserror::Error;
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, tungstenite::Message};

/// Capacity of both packet channels.
const CHANNEL_CAPACITY: usize = 32;

/// Time allowed for the Engine.IO and Socket.IO handshakes together.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Time allowed for queued events to drain when a channel is closed.
pub const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

type Socket = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Stream error.
    #[error("stream error: {0}")]
    Stream(String),

    /// Protocol error.
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Handle to an open channel.
///
/// Events are written through `to_server`; event packets from the server
/// arrive on `from_server` as raw Engine.IO text. `from_server` yields `None`
/// once the server closes the connection.
///
/// Dropping the handle aborts the connection task. Use
/// [`close`](Self::close) to deliver queued events first.
pub struct ConnectedChannel {
    /// Send events to the server.
    pub to_server: mpsc::Sender<OutboundEvent>,
    /// Receive event packets from the server.
    pub from_server: mpsc::Receiver<String>,
    task: TaskGuard,
}

impl ConnectedChannel {
    /// Close the connection.
    ///
    /// Events already queued on `to_server` are written in order, followed
    /// by an Engine.IO close packet. The task is aborted if it has not
    /// finished within [`CLOSE_TIMEOUT`].
    pub async fn close(self) {
        let Self { to_server, from_server, mut task } = self;
        drop(to_server);
        drop(from_server);

        if tokio::time::timeout(CLOSE_TIMEOUT, &mut task.0).await.is_err() {
            tracing::warn!("connection did not drain in time, aborting");
        }
    }
}

/// Aborts the connection task when dropped.
struct TaskGuard(JoinHandle<()>);

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Connect to a chat server.
///
/// `server` is the HTTP(S) base URL; the Socket.IO endpoint is derived from
/// it. Returns once the default namespace is connected.
pub async fn connect(server: &str) -> Result<ConnectedChannel, TransportError> {
    let url = socket_url(server)?;
    tracing::info!(%url, "connecting");

    let (socket, _response) = tokio_tungstenite::connect_async(url.as_str())
        .await
        .map_err(|e| TransportError::Connection(format!("websocket connect failed: {e}")))?;

    let socket = tokio::time::timeout(HANDSHAKE_TIMEOUT, handshake(socket))
        .await
        .map_err(|_| TransportError::Connection("handshake timed out".to_string()))??;

    let (to_server_tx, to_server_rx) = mpsc::channel::<OutboundEvent>(CHANNEL_CAPACITY);
    let (from_server_tx, from_server_rx) = mpsc::channel::<String>(CHANNEL_CAPACITY);

    let task = tokio::spawn(run_connection(socket, to_server_rx, from_server_tx));

    Ok(ConnectedChannel {
        to_server: to_server_tx,
        from_server: from_server_rx,
        task: TaskGuard(task),
    })
}

/// Engine.IO open, then Socket.IO namespace connect.
async fn handshake(mut socket: Socket) -> Result<Socket, TransportError> {
    match next_packet(&mut socket).await? {
        EnginePacket::Open(handshake) => {
            tracing::debug!(
                sid = %handshake.sid,
                ping_interval = handshake.ping_interval,
                "engine open"
            );
        },
        other => {
            return Err(TransportError::Protocol(format!("expected open packet, got {other:?}")));
        },
    }

    send_packet(&mut socket, &EnginePacket::Message(SocketPacket::Connect { sid: None })).await?;

    loop {
        match next_packet(&mut socket).await? {
            EnginePacket::Message(SocketPacket::Connect { sid }) => {
                tracing::debug!(?sid, "namespace connected");
                return Ok(socket);
            },
            EnginePacket::Message(SocketPacket::ConnectError { message }) => {
                return Err(TransportError::Connection(format!("namespace refused: {message}")));
            },
            EnginePacket::Ping => send_packet(&mut socket, &EnginePacket::Pong).await?,
            EnginePacket::Close => {
                return Err(TransportError::Connection("closed during handshake".to_string()));
            },
            other => tracing::debug!(?other, "ignoring packet during handshake"),
        }
    }
}

/// Run the connection, bridging between channels and the WebSocket.
///
/// Ends when `to_server` is closed and drained, writing a close packet, or
/// when the server goes away. Inbound packets are discarded once nobody
/// listens on `from_server`.
async fn run_connection(
    socket: Socket,
    mut to_server: mpsc::Receiver<OutboundEvent>,
    from_server: mpsc::Sender<String>,
) {
    let (mut write, mut read) = socket.split();

    loop {
        tokio::select! {
            outbound = to_server.recv() => {
                let Some(event) = outbound else {
                    let _ = write.send(Message::text(encode(&EnginePacket::Close))).await;
                    let _ = write.close().await;
                    break;
                };
                let text = encode(&event.into_packet());
                if let Err(e) = write.send(Message::text(text)).await {
                    tracing::warn!(error = %e, "send failed");
                    break;
                }
            },
            inbound = read.next() => {
                let text = match inbound {
                    Some(Ok(Message::Text(text))) => text.as_str().to_string(),
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "receive failed");
                        break;
                    },
                };

                match EnginePacket::decode(&text) {
                    Ok(EnginePacket::Ping) => {
                        let pong = Message::text(encode(&EnginePacket::Pong));
                        if let Err(e) = write.send(pong).await {
                            tracing::warn!(error = %e, "pong failed");
                            break;
                        }
                    },
                    Ok(EnginePacket::Close | EnginePacket::Message(SocketPacket::Disconnect)) => {
                        break;
                    },
                    Ok(EnginePacket::Message(SocketPacket::Event { .. })) | Err(_) => {
                        // Decoding errors are reported by the client.
                        if from_server.send(text).await.is_err() {
                            tracing::debug!("inbound receiver gone, discarding packet");
                        }
                    },
                    Ok(other) => tracing::debug!(?other, "ignoring packet"),
                }
            },
        }
    }

    tracing::info!("connection closed");
}

async fn next_packet(socket: &mut Socket) -> Result<EnginePacket, TransportError> {
    loop {
        match socket.next().await {
            Some(Ok(Message::Text(text))) => {
                return EnginePacket::decode(text.as_str())
                    .map_err(|e| TransportError::Protocol(e.to_string()));
            },
            Some(Ok(Message::Close(_))) | None => {
                return Err(TransportError::Stream("connection closed".to_string()));
            },
            Some(Ok(_)) => {},
            Some(Err(e)) => return Err(TransportError::Stream(e.to_string())),
        }
    }
}

async fn send_packet(socket: &mut Socket, packet: &EnginePacket) -> Result<(), TransportError> {
    socket
        .send(Message::text(encode(packet)))
        .await
        .map_err(|e| TransportError::Stream(format!("write failed: {e}")))
}

/// Control and event packets built from typed values always encode.
fn encode(packet: &EnginePacket) -> String {
    packet.encode().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "packet encode failed");
        String::from("6")
    })
}

/// Socket.IO WebSocket endpoint for an HTTP(S) base URL.
fn socket_url(server: &str) -> Result<String, TransportError> {
    let base = server.trim_end_matches('/');
    let ws_base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else if base.starts_with("ws://") || base.starts_with("wss://") {
        base.to_string()
    } else {
        return Err(TransportError::Connection(format!("unsupported server URL: {server}")));
    };

    Ok(format!("{ws_base}/socket.io/?EIO=4&transport=websocket"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn socket_url_from_https() {
        assert_eq!(
            socket_url("https://chat-api-ruddy.vercel.app/").unwrap(),
            "wss://chat-api-ruddy.vercel.app/socket.io/?EIO=4&transport=websocket"
        );
        assert_eq!(
            socket_url("http://localhost:3000").unwrap(),
            "ws://localhost:3000/socket.io/?EIO=4&transport=websocket"
        );
        assert!(socket_url("localhost:3000").is_err());
    }
}
