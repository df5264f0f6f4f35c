//! Match engine for Broadside.
//!
//! Everything here is synchronous and deterministic given a random source:
//! grids, ships, weapon geometry, cooldowns, fleet placement, and the
//! two-player state machine that ties them together. Nothing in this crate
//! knows about connections, timers, or wire formats.
//!
//! # Key types
//!
//! - [`Coordinate`]: a cell on the grid, displayed as `B5`
//! - [`Board`]: one player's grid and fleet; applies single-cell strikes
//! - [`FleetPlacer`]: randomized, gap-respecting fleet layout
//! - [`CooldownTracker`]: per-weapon readiness for one player
//! - [`resolve_attack`]: full weapon strike against a board
//! - [`MatchState`]: the authoritative match state machine
//!
//! # Layering
//!
//! ```text
//! MatchState
//!     ├── FleetPlacer ──→ Board, Ship
//!     ├── CooldownTracker ──→ Board (ship survival)
//!     └── resolve_attack ──→ affected_cells, Board
//! ```

mod attack;
mod board;
mod catalog;
mod cell;
mod cooldown;
mod coord;
mod error;
mod pattern;
mod placer;
mod ship;
mod state;

pub use attack::{AttackResult, CellOutcome, SunkShip, resolve_attack};
pub use board::Board;
pub use catalog::{GameMode, ShipType, WeaponType};
pub use cell::CellState;
pub use cooldown::CooldownTracker;
pub use coord::{Coordinate, MAX_GRID_SIZE, Orientation};
pub use error::{AttackRejection, BoardError, ParseError, SetupError};
pub use pattern::affected_cells;
pub use placer::{FleetPlacer, PlacementConfig};
pub use ship::Ship;
pub use state::{LOG_CAPACITY, MatchState, Phase, PlayerState, PlayerStats, Slot};
