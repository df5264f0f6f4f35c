//! Error types for matchmaking.

use broadside_protocol::ConnectionId;

use crate::SessionId;

/// Errors from [`Lobby`](crate::Lobby) operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LobbyError {
    /// The connection is already seated in a session.
    #[error("connection {0} has already joined")]
    AlreadyJoined(ConnectionId),

    /// Usernames must contain something other than whitespace.
    #[error("invalid username: {0:?}")]
    InvalidUsername(String),

    /// A freshly opened session would not seat its first player.
    #[error("session {0} refused its first player")]
    SeatRefused(SessionId),
}
