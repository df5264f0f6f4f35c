//! WebSocket transport using `tokio-tungstenite`.
//!
//! The listener hands out raw TCP streams; the WebSocket upgrade runs in the
//! connection's own task so a slow handshake never stalls the accept loop.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use broadside_protocol::ConnectionId;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;

use crate::TransportError;

/// Counter for generating unique connection ids.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

type WsStream = WebSocketStream<TcpStream>;

/// Listens for incoming TCP connections.
pub struct WebSocketListener {
    listener: TcpListener,
}

impl WebSocketListener {
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "WebSocket listener bound");
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr), TransportError> {
        self.listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)
    }
}

/// Runs the WebSocket handshake on an accepted stream and assigns the
/// connection its id.
pub async fn upgrade(
    stream: TcpStream,
    addr: SocketAddr,
) -> Result<WebSocketConnection, TransportError> {
    let ws = tokio_tungstenite::accept_async(stream)
        .await
        .map_err(TransportError::HandshakeFailed)?;
    let id = ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
    tracing::debug!(%id, %addr, "accepted WebSocket connection");
    Ok(WebSocketConnection { id, ws })
}

/// An upgraded connection, not yet split into its two halves.
pub struct WebSocketConnection {
    id: ConnectionId,
    ws: WsStream,
}

impl WebSocketConnection {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Splits into a writer and a reader that can live in separate tasks.
    pub fn split(self) -> (ConnectionWriter, ConnectionReader) {
        let (sink, stream) = self.ws.split();
        (ConnectionWriter { sink }, ConnectionReader { stream })
    }
}

/// Sending half of a connection.
pub struct ConnectionWriter {
    sink: SplitSink<WsStream, Message>,
}

impl ConnectionWriter {
    /// Sends one encoded message. UTF-8 payloads go out as text frames,
    /// anything else as binary.
    pub async fn send(&mut self, data: Vec<u8>) -> Result<(), TransportError> {
        let msg = match String::from_utf8(data) {
            Ok(text) => Message::Text(text.into()),
            Err(e) => Message::Binary(e.into_bytes().into()),
        };
        self.sink
            .send(msg)
            .await
            .map_err(TransportError::SendFailed)
    }

    pub async fn close(&mut self) -> Result<(), TransportError> {
        self.sink.close().await.map_err(TransportError::SendFailed)
    }
}

/// Receiving half of a connection.
pub struct ConnectionReader {
    stream: SplitStream<WsStream>,
}

impl ConnectionReader {
    /// Next data frame's payload, or `None` once the peer has closed.
    /// Ping, pong, and raw frames are skipped.
    pub async fn recv(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text.as_bytes().to_vec())),
                Some(Ok(Message::Binary(data))) => return Ok(Some(data.to_vec())),
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(TransportError::ReceiveFailed(e)),
            }
        }
    }
}
