//! Error types for the Broadside server.

use broadside_engine::{AttackRejection, ParseError, SetupError};
use broadside_match::LobbyError;
use broadside_protocol::ProtocolError;

/// Errors from the WebSocket layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Binding the listener or accepting a TCP stream failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// The WebSocket upgrade handshake failed.
    #[error("websocket handshake failed: {0}")]
    HandshakeFailed(#[source] tokio_tungstenite::tungstenite::Error),

    /// Writing a frame failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] tokio_tungstenite::tungstenite::Error),

    /// Reading a frame failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] tokio_tungstenite::tungstenite::Error),
}

/// Why a player's command was refused. Sent back to that player as an
/// `error` event; never fatal to the connection.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// A mode, weapon, orientation, or coordinate that names nothing.
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Lobby(#[from] LobbyError),

    /// The match refused the attack.
    #[error(transparent)]
    Attack(#[from] AttackRejection),

    /// The command needs a seat, and the connection has none.
    #[error("you have not joined a game")]
    NotSeated,

    /// Mode voting needs both seats filled.
    #[error("still waiting for an opponent")]
    NoOpponent,

    /// Forfeit outside a running match.
    #[error("no match in progress")]
    NoMatch,

    /// Rematch answer outside a finished match.
    #[error("no finished match to replay")]
    NotFinished,
}

/// Top-level error wrapping every crate's errors.
///
/// `#[from]` on each variant lets `?` convert the layer errors directly.
#[derive(Debug, thiserror::Error)]
pub enum BroadsideError {
    /// A transport-level error (bind, handshake, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A matchmaking error (duplicate join, bad username).
    #[error(transparent)]
    Lobby(#[from] LobbyError),

    /// A match could not be set up.
    #[error(transparent)]
    Setup(#[from] SetupError),
}
