//! Placed ships.

use std::collections::BTreeSet;
use std::fmt;

use crate::{Coordinate, ShipType};

/// A ship on a board: its class, id, the cells it covers, and which of
/// those have been struck.
///
/// A ship is sunk exactly when every occupied cell is in the hit set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ship {
    kind: ShipType,
    id: String,
    cells: Vec<Coordinate>,
    hits: BTreeSet<Coordinate>,
}

impl Ship {
    pub fn new(kind: ShipType, id: impl Into<String>, cells: Vec<Coordinate>) -> Self {
        Self {
            kind,
            id: id.into(),
            cells,
            hits: BTreeSet::new(),
        }
    }

    /// Builds the id for the `instance`-th ship (1-based) of a class:
    /// `PB-A`, `PB-B`, ...
    pub fn make_id(kind: ShipType, instance: usize) -> String {
        let letter = u8::try_from(instance.saturating_sub(1))
            .ok()
            .filter(|n| *n < 26)
            .map(|n| char::from(b'A' + n))
            .unwrap_or('?');
        format!("{}-{}", kind.code(), letter)
    }

    pub fn kind(&self) -> ShipType {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Occupied cells, in the order they were laid out.
    pub fn cells(&self) -> &[Coordinate] {
        &self.cells
    }

    pub fn hits(&self) -> &BTreeSet<Coordinate> {
        &self.hits
    }

    pub fn occupies(&self, coord: Coordinate) -> bool {
        self.cells.contains(&coord)
    }

    /// Records a hit. Returns `false` if the cell isn't part of this ship or
    /// was already hit.
    pub fn hit(&mut self, coord: Coordinate) -> bool {
        self.occupies(coord) && self.hits.insert(coord)
    }

    pub fn is_sunk(&self) -> bool {
        self.hits.len() == self.cells.len()
    }

    /// Cells not yet struck.
    pub fn remaining_health(&self) -> usize {
        self.cells.len() - self.hits.len()
    }

    pub fn max_health(&self) -> usize {
        self.cells.len()
    }
}

impl fmt::Display for Ship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_sunk() {
            write!(f, "{} [{}] SUNK", self.id, self.kind)
        } else {
            write!(
                f,
                "{} [{}] {}/{}",
                self.id,
                self.kind,
                self.remaining_health(),
                self.max_health()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patrol_boat() -> Ship {
        Ship::new(
            ShipType::PatrolBoat,
            "PB-A",
            vec![Coordinate::new(0, 0), Coordinate::new(0, 1)],
        )
    }

    #[test]
    fn test_make_id() {
        assert_eq!(Ship::make_id(ShipType::Destroyer, 1), "DS-A");
        assert_eq!(Ship::make_id(ShipType::Destroyer, 2), "DS-B");
        assert_eq!(Ship::make_id(ShipType::Carrier, 1), "CARR-A");
    }

    #[test]
    fn test_hit_records_each_cell_once() {
        let mut ship = patrol_boat();
        assert!(ship.hit(Coordinate::new(0, 0)));
        assert!(!ship.hit(Coordinate::new(0, 0)));
        assert!(!ship.hit(Coordinate::new(5, 5)));
        assert_eq!(ship.remaining_health(), 1);
        assert!(!ship.is_sunk());
    }

    #[test]
    fn test_sunk_when_every_cell_hit() {
        let mut ship = patrol_boat();
        ship.hit(Coordinate::new(0, 0));
        ship.hit(Coordinate::new(0, 1));
        assert!(ship.is_sunk());
        assert_eq!(ship.to_string(), "PB-A [Patrol Boat] SUNK");
    }

    #[test]
    fn test_display_shows_health() {
        assert_eq!(patrol_boat().to_string(), "PB-A [Patrol Boat] 2/2");
    }
}
