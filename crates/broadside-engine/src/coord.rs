//! Grid coordinates and orientation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ParseError;

/// Largest grid any game mode uses. Column letters run `A..=P`.
pub const MAX_GRID_SIZE: usize = 16;

/// A zero-indexed `(row, col)` cell.
///
/// The canonical text form is the column letter followed by the 1-based row
/// number: `Coordinate::new(4, 1)` is `B5`. That is also how a coordinate
/// serializes, so a target travels on the wire as `"B5"`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Coordinate {
    row: usize,
    col: usize,
}

impl Coordinate {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn col(&self) -> usize {
        self.col
    }

    /// Returns `true` if both axes fall in `0..grid_size`.
    pub fn is_within(&self, grid_size: usize) -> bool {
        self.row < grid_size && self.col < grid_size
    }

    /// The cell `(dr, dc)` away, or `None` if that would go below zero.
    ///
    /// No upper bound is applied here; callers clip against their grid.
    pub fn offset(&self, dr: isize, dc: isize) -> Option<Self> {
        Some(Self {
            row: self.row.checked_add_signed(dr)?,
            col: self.col.checked_add_signed(dc)?,
        })
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = u32::try_from(self.col)
            .ok()
            .and_then(|c| char::from_u32('A' as u32 + c))
            .unwrap_or('?');
        write!(f, "{}{}", letter, self.row + 1)
    }
}

impl FromStr for Coordinate {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError::Coordinate(s.to_string());
        let text = s.trim();

        let mut chars = text.chars();
        let letter = chars.next().ok_or_else(invalid)?.to_ascii_uppercase();
        if !letter.is_ascii_uppercase() {
            return Err(invalid());
        }
        let col = (letter as u8 - b'A') as usize;
        if col >= MAX_GRID_SIZE {
            return Err(invalid());
        }

        let digits = chars.as_str();
        if digits.is_empty() || digits.len() > 2 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let row_number: usize = digits.parse().map_err(|_| invalid())?;
        if !(1..=MAX_GRID_SIZE).contains(&row_number) {
            return Err(invalid());
        }

        Ok(Self::new(row_number - 1, col))
    }
}

impl TryFrom<String> for Coordinate {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Coordinate> for String {
    fn from(coord: Coordinate) -> Self {
        coord.to_string()
    }
}

/// Which way a ship lies, or which way a Line Barrage sweeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

impl FromStr for Orientation {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "H" | "HORIZONTAL" => Ok(Self::Horizontal),
            "V" | "VERTICAL" => Ok(Self::Vertical),
            _ => Err(ParseError::Orientation(s.to_string())),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Horizontal => write!(f, "HORIZONTAL"),
            Self::Vertical => write!(f, "VERTICAL"),
        }
    }
}
