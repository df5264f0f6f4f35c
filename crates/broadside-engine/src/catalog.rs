//! The fixed catalogs: weapons, ship classes, and game modes.
//!
//! All three are closed enums. Per-weapon tables elsewhere in the engine
//! are plain arrays indexed by [`WeaponType::index`], so every weapon always
//! has an entry.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ParseError;

// ---------------------------------------------------------------------------
// WeaponType
// ---------------------------------------------------------------------------

/// A weapon a player can fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeaponType {
    StandardShot,
    LineBarrage,
    CrossBomber,
    Nuke,
}

impl WeaponType {
    /// Number of weapons in the catalog.
    pub const COUNT: usize = 4;

    /// Every weapon, in catalog order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::StandardShot,
        Self::LineBarrage,
        Self::CrossBomber,
        Self::Nuke,
    ];

    /// Position in [`Self::ALL`].
    pub fn index(self) -> usize {
        match self {
            Self::StandardShot => 0,
            Self::LineBarrage => 1,
            Self::CrossBomber => 2,
            Self::Nuke => 3,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::StandardShot => "Standard Shot",
            Self::LineBarrage => "Line Barrage",
            Self::CrossBomber => "Cross Bomber",
            Self::Nuke => "Nuke",
        }
    }

    /// Short description of the strike pattern.
    pub fn description(&self) -> &'static str {
        match self {
            Self::StandardShot => "1x1 single tile",
            Self::LineBarrage => "1x3 line (H or V)",
            Self::CrossBomber => "+ shape (5 tiles)",
            Self::Nuke => "3x3 square (9 tiles)",
        }
    }

    /// Turns the weapon stays unusable after firing. 0 = every turn.
    pub fn cooldown(&self) -> u32 {
        match self {
            Self::StandardShot => 0,
            Self::LineBarrage => 2,
            Self::CrossBomber => 3,
            Self::Nuke => 5,
        }
    }

    /// Only the Line Barrage cares which way it is aimed.
    pub fn needs_orientation(&self) -> bool {
        matches!(self, Self::LineBarrage)
    }
}

impl fmt::Display for WeaponType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for WeaponType {
    type Err = ParseError;

    /// Accepts the wire name (`LINE_BARRAGE`) or the display name
    /// (`Line Barrage`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        Self::ALL
            .into_iter()
            .find(|w| normalize(w.display_name()) == wanted)
            .ok_or_else(|| ParseError::Weapon(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// ShipType
// ---------------------------------------------------------------------------

/// A ship class. Each class grants one weapon while any ship of that class
/// is still afloat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipType {
    PatrolBoat,
    Submarine,
    Destroyer,
    Battleship,
    Carrier,
}

impl ShipType {
    pub const ALL: [Self; 5] = [
        Self::PatrolBoat,
        Self::Submarine,
        Self::Destroyer,
        Self::Battleship,
        Self::Carrier,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::PatrolBoat => "Patrol Boat",
            Self::Submarine => "Submarine",
            Self::Destroyer => "Destroyer",
            Self::Battleship => "Battleship",
            Self::Carrier => "Carrier",
        }
    }

    /// Short code used in ship ids and fleet listings.
    pub fn code(&self) -> &'static str {
        match self {
            Self::PatrolBoat => "PB",
            Self::Submarine => "SUB",
            Self::Destroyer => "DS",
            Self::Battleship => "BATS",
            Self::Carrier => "CARR",
        }
    }

    pub fn length(&self) -> usize {
        match self {
            Self::PatrolBoat => 2,
            Self::Submarine | Self::Destroyer => 3,
            Self::Battleship => 4,
            Self::Carrier => 5,
        }
    }

    /// Cells across. Only the Carrier is two wide.
    pub fn width(&self) -> usize {
        match self {
            Self::Carrier => 2,
            _ => 1,
        }
    }

    pub fn tile_count(&self) -> usize {
        self.length() * self.width()
    }

    /// The weapon this class provides.
    pub fn weapon(&self) -> WeaponType {
        match self {
            Self::PatrolBoat | Self::Submarine => WeaponType::StandardShot,
            Self::Destroyer => WeaponType::LineBarrage,
            Self::Battleship => WeaponType::CrossBomber,
            Self::Carrier => WeaponType::Nuke,
        }
    }
}

impl fmt::Display for ShipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// ---------------------------------------------------------------------------
// GameMode
// ---------------------------------------------------------------------------

/// A game mode: grid size plus the fleet each player deploys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameMode {
    Blitz,
    Strike,
    War,
}

impl GameMode {
    pub const ALL: [Self; 3] = [Self::Blitz, Self::Strike, Self::War];

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Blitz => "Blitz",
            Self::Strike => "Strike",
            Self::War => "War",
        }
    }

    pub fn grid_size(&self) -> usize {
        match self {
            Self::Blitz => 8,
            Self::Strike => 12,
            Self::War => 16,
        }
    }

    /// The ordered fleet manifest.
    pub fn fleet(&self) -> &'static [ShipType] {
        use ShipType::*;
        match self {
            Self::Blitz => &[PatrolBoat, Submarine, Destroyer],
            Self::Strike => &[PatrolBoat, Submarine, Destroyer, Battleship, Carrier],
            Self::War => &[
                PatrolBoat, PatrolBoat, Submarine, Destroyer, Destroyer, Battleship, Carrier,
            ],
        }
    }

    pub fn ship_count(&self) -> usize {
        self.fleet().len()
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for GameMode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        Self::ALL
            .into_iter()
            .find(|m| normalize(m.display_name()) == wanted)
            .ok_or_else(|| ParseError::Mode(s.to_string()))
    }
}

/// Uppercases and drops separators so `line_barrage`, `LINE BARRAGE`, and
/// `Line Barrage` compare equal.
fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}
