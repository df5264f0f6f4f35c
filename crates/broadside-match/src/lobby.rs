//! Matchmaking: pairs connections into sessions and tracks who is where.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use broadside_engine::Slot;
use broadside_protocol::ConnectionId;
use tokio::sync::{Mutex, mpsc};

use crate::{LobbyError, MatchConfig, MatchSession, SessionId, TurnExpired};

/// Counter for generating unique session ids.
static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// A session shared between the lobby and every task acting on it.
///
/// Lock order is lobby first, then session. Nothing holds a session lock
/// while waiting for the lobby.
pub type SharedSession = Arc<Mutex<MatchSession>>;

/// Where a [`Lobby::join`] put the player.
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    pub session: SharedSession,
    pub session_id: SessionId,
    pub slot: Slot,
    /// Both seats are now taken and the mode vote can begin.
    pub ready: bool,
}

/// What [`Lobby::remove`] found for a departing connection.
#[derive(Debug, Clone)]
pub struct Departure {
    pub session: SharedSession,
    pub session_id: SessionId,
    pub slot: Slot,
    /// The departure decided a running match in the opponent's favour.
    pub ended_match: bool,
}

#[derive(Default)]
struct Registry {
    sessions: HashMap<SessionId, SharedSession>,
    /// At most one session waiting for its second player.
    waiting: Option<SessionId>,
    players: HashMap<ConnectionId, SessionId>,
}

/// Pairs arriving connections two at a time.
///
/// The first arrival opens a session and waits; the next one fills it. All
/// registry changes go through one mutex.
pub struct Lobby {
    registry: Mutex<Registry>,
    config: MatchConfig,
    expiry_tx: mpsc::UnboundedSender<TurnExpired>,
}

impl Lobby {
    /// Creates an empty lobby. Turn timeouts from every session it creates
    /// arrive on the returned receiver.
    pub fn new(config: MatchConfig) -> (Self, mpsc::UnboundedReceiver<TurnExpired>) {
        let (expiry_tx, expiry_rx) = mpsc::unbounded_channel();
        let lobby = Self {
            registry: Mutex::new(Registry::default()),
            config,
            expiry_tx,
        };
        (lobby, expiry_rx)
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Seats `conn` in the waiting session, or opens a new one for it.
    pub async fn join(
        &self,
        conn: ConnectionId,
        username: &str,
    ) -> Result<JoinOutcome, LobbyError> {
        let username = valid_username(username)?;
        let mut registry = self.registry.lock().await;
        if registry.players.contains_key(&conn) {
            return Err(LobbyError::AlreadyJoined(conn));
        }
        self.join_locked(&mut registry, conn, username).await
    }

    /// Clears `conn`'s old seat and queues it again. Used when the opponent
    /// turned down a rematch.
    pub async fn requeue(
        &self,
        conn: ConnectionId,
        username: &str,
    ) -> Result<JoinOutcome, LobbyError> {
        let username = valid_username(username)?;
        let mut registry = self.registry.lock().await;
        registry.players.remove(&conn);
        self.join_locked(&mut registry, conn, username).await
    }

    async fn join_locked(
        &self,
        registry: &mut Registry,
        conn: ConnectionId,
        username: &str,
    ) -> Result<JoinOutcome, LobbyError> {
        if let Some(waiting_id) = registry.waiting.take() {
            if let Some(session) = registry.sessions.get(&waiting_id).cloned() {
                let seated = session.lock().await.add_player(conn, username);
                if let Some(slot) = seated {
                    registry.players.insert(conn, waiting_id);
                    tracing::info!(session = %waiting_id, %conn, %slot, "session ready");
                    return Ok(JoinOutcome {
                        session,
                        session_id: waiting_id,
                        slot,
                        ready: true,
                    });
                }
                tracing::error!(session = %waiting_id, "waiting session refused a player");
            }
        }

        let session_id = SessionId::new(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed));
        let mut session =
            MatchSession::new(session_id, self.config.clone(), self.expiry_tx.clone());
        let slot = session
            .add_player(conn, username)
            .ok_or(LobbyError::SeatRefused(session_id))?;
        let session = Arc::new(Mutex::new(session));

        registry.sessions.insert(session_id, Arc::clone(&session));
        registry.players.insert(conn, session_id);
        registry.waiting = Some(session_id);
        tracing::info!(session = %session_id, %conn, "session created, waiting for opponent");

        Ok(JoinOutcome {
            session,
            session_id,
            slot,
            ready: false,
        })
    }

    /// Detaches a departing connection.
    ///
    /// A session that was only waiting is discarded. A running match is
    /// awarded to the player who stayed.
    pub async fn remove(&self, conn: ConnectionId) -> Option<Departure> {
        let mut registry = self.registry.lock().await;
        let session_id = registry.players.remove(&conn)?;
        let session = registry.sessions.get(&session_id).cloned()?;

        let (slot, ended_match) = {
            let mut guard = session.lock().await;
            let slot = guard.slot_of(conn)?;
            (slot, guard.disconnect(slot))
        };

        if registry.waiting == Some(session_id) {
            registry.waiting = None;
            registry.sessions.remove(&session_id);
            tracing::info!(session = %session_id, "waiting session discarded");
        }
        tracing::info!(session = %session_id, %conn, %slot, ended_match, "player left");

        Some(Departure {
            session,
            session_id,
            slot,
            ended_match,
        })
    }

    /// Tears a session down: both connections unmapped, timer stopped,
    /// session dropped.
    pub async fn cleanup(&self, session_id: SessionId) {
        let mut registry = self.registry.lock().await;
        let Some(session) = registry.sessions.remove(&session_id) else {
            return;
        };
        let members = {
            let mut guard = session.lock().await;
            guard.shutdown();
            guard.members()
        };
        for conn in members {
            if registry.players.get(&conn) == Some(&session_id) {
                registry.players.remove(&conn);
            }
        }
        if registry.waiting == Some(session_id) {
            registry.waiting = None;
        }
        tracing::info!(session = %session_id, "session cleaned up");
    }

    /// The session `conn` is seated in.
    pub async fn session_for(&self, conn: ConnectionId) -> Option<SharedSession> {
        let registry = self.registry.lock().await;
        let id = registry.players.get(&conn)?;
        registry.sessions.get(id).cloned()
    }

    pub async fn session(&self, id: SessionId) -> Option<SharedSession> {
        self.registry.lock().await.sessions.get(&id).cloned()
    }

    /// Sessions currently tracked, waiting ones included.
    pub async fn session_count(&self) -> usize {
        self.registry.lock().await.sessions.len()
    }
}

/// Trims `username`, refusing one that is blank.
fn valid_username(username: &str) -> Result<&str, LobbyError> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        return Err(LobbyError::InvalidUsername(username.to_string()));
    }
    Ok(trimmed)
}
