//! # Broadside
//!
//! Server for a two-player, turn-based naval combat game played over
//! WebSocket.
//!
//! Players connect, send `join` with a username, and are paired two at a
//! time. The pair votes on a game mode, fleets are placed at random, and the
//! players take turns firing weapons at each other's grid until one fleet is
//! sunk, someone forfeits, or a turn times out.
//!
//! ## Layers
//!
//! ```text
//! WebSocket ─→ handler ─→ Dispatcher ─→ Lobby ─→ MatchSession ─→ MatchState
//!     ↑                       │
//!     └──── outboxes ←── (ConnectionId, ServerEvent)
//! ```
//!
//! - [`broadside_engine`]: rules, boards, weapons, placement
//! - [`broadside_protocol`]: commands, events, codec
//! - [`broadside_match`]: lobby, sessions, turn timers
//! - this crate: dispatch and the network server
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use broadside::prelude::*;
//!
//! # async fn demo() -> Result<(), BroadsideError> {
//! let server = BroadsideServer::builder()
//!     .bind("0.0.0.0:8025")
//!     .match_config(MatchConfig::default())
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

mod dispatch;
mod error;
pub mod events;
mod handler;
mod server;
mod transport;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use dispatch::{Dispatcher, Outbound};
pub use error::{BroadsideError, CommandError, TransportError};
pub use server::{BroadsideServer, BroadsideServerBuilder, DEFAULT_BIND};

pub use broadside_engine;
pub use broadside_match;
pub use broadside_protocol;

/// Everything needed to run a server or drive a [`Dispatcher`] directly.
pub mod prelude {
    pub use crate::{BroadsideError, BroadsideServer, BroadsideServerBuilder, Dispatcher, Outbound};
    pub use broadside_engine::{Coordinate, GameMode, Orientation, ShipType, WeaponType};
    pub use broadside_match::MatchConfig;
    pub use broadside_protocol::{ClientCommand, ConnectionId, ServerEvent};
}
