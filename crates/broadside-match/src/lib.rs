//! Matchmaking and match orchestration for Broadside.
//!
//! Sits between the engine (pure rules) and the server (connections):
//! pairs connections into sessions, runs the mode and rematch votes, and
//! enforces the turn timeout.
//!
//! # Key types
//!
//! - [`Lobby`]: pairs arriving connections and tracks who is in which
//!   session
//! - [`MatchSession`]: one match's lifecycle around a
//!   [`MatchState`](broadside_engine::MatchState)
//! - [`TurnTimer`]: the cancellable per-turn deadline
//! - [`MatchConfig`]: timeout, placement budgets, and seed
//!
//! # Timeouts
//!
//! ```text
//! TurnTimer ──TurnExpired──→ channel ──→ consumer
//!                                            │
//!                                            └──→ MatchSession::handle_turn_expired
//! ```
//!
//! The timer task never locks a session. Whoever owns the receiver from
//! [`Lobby::new`] looks the session up and applies the notice, so a timeout
//! takes the same path as a player forfeit.

mod config;
mod error;
mod lobby;
mod session;
mod timer;

pub use config::MatchConfig;
pub use error::LobbyError;
pub use lobby::{Departure, JoinOutcome, Lobby, SharedSession};
pub use session::{MatchSession, RematchDecision, SessionId, TurnExpired};
pub use timer::TurnTimer;
