//! Per-connection handler: upgrade, read loop, and write loop.
//!
//! Each accepted stream gets its own task running [`handle_connection`]:
//!   1. WebSocket upgrade → the connection gets its id
//!   2. Outbox registered, writer task spawned
//!   3. Loop: decode commands → dispatcher → deliver events
//!   4. On exit the guard unregisters the outbox and reports the disconnect

use std::net::SocketAddr;
use std::sync::Arc;

use broadside_protocol::{ClientCommand, Codec, ConnectionId, ServerEvent};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use crate::server::ServerState;
use crate::transport::{self, ConnectionWriter};
use crate::{BroadsideError, events};

/// Drop guard that retires a connection when its handler exits, however it
/// exits. `Drop` is synchronous, so the async part runs in its own task.
struct ConnectionGuard {
    conn_id: ConnectionId,
    state: Arc<ServerState>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            state.unregister(conn_id).await;
            let outbound = state.dispatcher.disconnected(conn_id).await;
            state.deliver(outbound).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    state: Arc<ServerState>,
) -> Result<(), BroadsideError> {
    let conn = transport::upgrade(stream, addr).await?;
    let conn_id = conn.id();
    let (writer, mut reader) = conn.split();

    let (outbox, queue) = mpsc::unbounded_channel();
    state.register(conn_id, outbox).await;
    let _guard = ConnectionGuard {
        conn_id,
        state: Arc::clone(&state),
    };
    tokio::spawn(write_loop(conn_id, writer, queue, state.codec));
    tracing::info!(%conn_id, %addr, "player connected");

    loop {
        let data = match reader.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%conn_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        let command: ClientCommand = match state.codec.decode(&data) {
            Ok(command) => command,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to decode command");
                state
                    .deliver(vec![(conn_id, events::error(format!("malformed message: {e}")))])
                    .await;
                continue;
            }
        };

        let outbound = state.dispatcher.handle(conn_id, command).await;
        state.deliver(outbound).await;
    }

    // _guard drops here → disconnect is dispatched.
    Ok(())
}

/// Drains the connection's outbox onto the socket until the outbox is
/// unregistered or the socket fails.
async fn write_loop<C: Codec>(
    conn_id: ConnectionId,
    mut writer: ConnectionWriter,
    mut queue: mpsc::UnboundedReceiver<ServerEvent>,
    codec: C,
) {
    while let Some(event) = queue.recv().await {
        let data = match codec.encode(&event) {
            Ok(data) => data,
            Err(e) => {
                tracing::error!(%conn_id, error = %e, "failed to encode event");
                continue;
            }
        };
        if let Err(e) = writer.send(data).await {
            tracing::debug!(%conn_id, error = %e, "send error");
            return;
        }
    }
    let _ = writer.close().await;
}
