//! Cell states.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The state of one grid cell.
///
/// `Empty` and `Ship` have not been fired on. `Miss`, `Hit`, and `Sunk` are
/// terminal: striking them again changes nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CellState {
    #[default]
    Empty,
    Ship,
    Miss,
    Hit,
    Sunk,
}

impl CellState {
    /// Returns `true` once the cell has been fired on.
    pub fn is_attacked(&self) -> bool {
        matches!(self, Self::Miss | Self::Hit | Self::Sunk)
    }

    /// Returns `true` for cells holding a ship segment, struck or not.
    pub fn is_occupied(&self) -> bool {
        matches!(self, Self::Ship | Self::Hit | Self::Sunk)
    }

    /// Returns `true` for a strike that landed on a ship.
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit | Self::Sunk)
    }

    /// How the cell looks to the opponent: unstruck ship segments read as
    /// open water.
    pub fn fogged(self) -> Self {
        match self {
            Self::Ship => Self::Empty,
            other => other,
        }
    }
}

impl fmt::Display for CellState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "EMPTY"),
            Self::Ship => write!(f, "SHIP"),
            Self::Miss => write!(f, "MISS"),
            Self::Hit => write!(f, "HIT"),
            Self::Sunk => write!(f, "SUNK"),
        }
    }
}
