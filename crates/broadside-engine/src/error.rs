//! Error types for the engine.
//!
//! The engine separates three kinds of failure:
//!
//! - [`ParseError`]: text from a client that doesn't name anything we know.
//! - [`AttackRejection`]: an illegal move. Expected during normal play
//!   and reported back to the player, never treated as a fault.
//! - [`SetupError`] / [`BoardError`]: broken invariants. Match setup
//!   aborts instead of continuing with a half-built board.

use crate::{Coordinate, GameMode, Phase, WeaponType};

/// A name or coordinate string that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Not a column letter followed by a row number, or outside `A1..P16`.
    #[error("invalid coordinate: {0:?}")]
    Coordinate(String),

    /// Not one of the game mode names.
    #[error("unknown game mode: {0:?}")]
    Mode(String),

    /// Not one of the weapon names.
    #[error("unknown weapon: {0:?}")]
    Weapon(String),

    /// Neither `HORIZONTAL` nor `VERTICAL`.
    #[error("unknown orientation: {0:?}")]
    Orientation(String),
}

/// Errors raised when placing a ship on a board by hand.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    /// One of the ship's cells lies outside the grid.
    #[error("cell {0} is outside the grid")]
    OutOfBounds(Coordinate),

    /// One of the ship's cells is already occupied.
    #[error("cell {0} is already occupied")]
    Overlap(Coordinate),
}

/// Fatal errors during match setup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SetupError {
    /// `setup` was called before both slots were filled.
    #[error("cannot start a match without two players")]
    NotEnoughPlayers,

    /// `setup` was called outside the lobby phase.
    #[error("cannot set up a match in phase {0}")]
    WrongPhase(Phase),

    /// The placer ran out of whole-board attempts.
    #[error("could not place the {mode} fleet after {attempts} board attempts")]
    PlacementExhausted { mode: GameMode, attempts: u32 },
}

/// Why an attack was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttackRejection {
    /// The match isn't running.
    #[error("no match in progress (phase {0})")]
    NotInProgress(Phase),

    /// The attacker doesn't hold the turn.
    #[error("it is not your turn")]
    NotYourTurn,

    /// Weapon on cooldown, or its ship class has been wiped out.
    #[error("{} is not available", .0.display_name())]
    WeaponUnavailable(WeaponType),

    /// Target outside the match grid.
    #[error("target {0} is outside the grid")]
    OutOfBounds(Coordinate),
}
