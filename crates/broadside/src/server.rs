//! `BroadsideServer` builder and server loop.
//!
//! Ties the layers together: transport → codec → dispatcher → lobby →
//! session → engine, and routes the dispatcher's addressed events back out
//! to each connection's writer.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use broadside_match::{MatchConfig, TurnExpired};
use broadside_protocol::{ConnectionId, JsonCodec, ServerEvent};
use tokio::sync::{Mutex, mpsc};

use crate::handler::handle_connection;
use crate::transport::WebSocketListener;
use crate::{BroadsideError, Dispatcher, Outbound};

/// Address the builder binds to unless told otherwise.
pub const DEFAULT_BIND: &str = "0.0.0.0:8025";

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState {
    pub(crate) dispatcher: Dispatcher,
    pub(crate) codec: JsonCodec,
    /// Per-connection queues drained by each connection's writer task.
    outboxes: Mutex<HashMap<ConnectionId, mpsc::UnboundedSender<ServerEvent>>>,
}

impl ServerState {
    pub(crate) async fn register(
        &self,
        conn: ConnectionId,
        outbox: mpsc::UnboundedSender<ServerEvent>,
    ) {
        self.outboxes.lock().await.insert(conn, outbox);
    }

    pub(crate) async fn unregister(&self, conn: ConnectionId) {
        self.outboxes.lock().await.remove(&conn);
    }

    /// Queues each event on its recipient's outbox. Events for connections
    /// that have already gone are dropped.
    pub(crate) async fn deliver(&self, outbound: Outbound) {
        if outbound.is_empty() {
            return;
        }
        let outboxes = self.outboxes.lock().await;
        for (conn, event) in outbound {
            match outboxes.get(&conn) {
                Some(outbox) => {
                    if outbox.send(event).is_err() {
                        tracing::debug!(%conn, "outbox closed, event dropped");
                    }
                }
                None => tracing::debug!(%conn, "no outbox for recipient, event dropped"),
            }
        }
    }
}

/// Builder for configuring and starting a Broadside server.
///
/// # Example
///
/// ```rust,no_run
/// # async fn demo() -> Result<(), broadside::BroadsideError> {
/// let server = broadside::BroadsideServer::builder()
///     .bind("127.0.0.1:8025")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct BroadsideServerBuilder {
    bind_addr: String,
    match_config: MatchConfig,
}

impl BroadsideServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: DEFAULT_BIND.to_string(),
            match_config: MatchConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets turn timeout, placement budgets, and seed for every match.
    pub fn match_config(mut self, config: MatchConfig) -> Self {
        self.match_config = config;
        self
    }

    /// Binds the listener. Nothing is accepted until [`BroadsideServer::run`].
    pub async fn build(self) -> Result<BroadsideServer, BroadsideError> {
        let listener = WebSocketListener::bind(&self.bind_addr).await?;
        let (dispatcher, expiries) = Dispatcher::new(self.match_config);
        let state = Arc::new(ServerState {
            dispatcher,
            codec: JsonCodec,
            outboxes: Mutex::new(HashMap::new()),
        });
        Ok(BroadsideServer {
            listener,
            state,
            expiries,
        })
    }
}

impl Default for BroadsideServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Broadside server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct BroadsideServer {
    listener: WebSocketListener,
    state: Arc<ServerState>,
    expiries: mpsc::UnboundedReceiver<TurnExpired>,
}

impl BroadsideServer {
    /// Creates a new builder.
    pub fn builder() -> BroadsideServerBuilder {
        BroadsideServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the server.
    ///
    /// Spawns the turn-timeout consumer, then accepts connections forever,
    /// one handler task each.
    pub async fn run(self) -> Result<(), BroadsideError> {
        let Self {
            listener,
            state,
            mut expiries,
        } = self;
        tracing::info!("Broadside server running");

        let timeouts = Arc::clone(&state);
        tokio::spawn(async move {
            while let Some(notice) = expiries.recv().await {
                let outbound = timeouts.dispatcher.turn_expired(notice).await;
                timeouts.deliver(outbound).await;
            }
        });

        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    let state = Arc::clone(&state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, addr, state).await {
                            tracing::debug!(error = %e, %addr, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
