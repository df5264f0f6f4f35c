//! Full weapon strikes.

use serde::{Deserialize, Serialize};

use crate::{Board, CellState, Coordinate, Orientation, ShipType, WeaponType, affected_cells};

/// What one affected cell became.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellOutcome {
    pub coordinate: Coordinate,
    pub state: CellState,
}

/// A ship sunk by a strike.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SunkShip {
    pub id: String,
    pub kind: ShipType,
}

/// Summary of one weapon strike.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackResult {
    pub weapon: WeaponType,
    pub target: Coordinate,
    pub orientation: Orientation,
    /// One entry per affected cell, in pattern order.
    pub cells: Vec<CellOutcome>,
    /// Ships that went down during this strike, each listed once.
    pub sunk: Vec<SunkShip>,
    /// The defender has no unstruck ship cell left.
    pub game_over: bool,
}

impl AttackResult {
    /// Cells that landed on a ship (`Hit` or `Sunk`).
    pub fn hit_count(&self) -> usize {
        self.cells.iter().filter(|c| c.state.is_hit()).count()
    }

    pub fn miss_count(&self) -> usize {
        self.cells.len() - self.hit_count()
    }
}

/// Fires `weapon` at `target` on the defender's `board`.
///
/// Each affected cell is struck in turn. Whenever a strike reports `Sunk`
/// the fleet is compared with its state just before that cell, so only
/// ships that actually went down now are reported, never ones sunk on an
/// earlier turn.
pub fn resolve_attack(
    board: &mut Board,
    weapon: WeaponType,
    target: Coordinate,
    orientation: Orientation,
) -> AttackResult {
    let mut cells = Vec::new();
    let mut sunk: Vec<SunkShip> = Vec::new();

    for coord in affected_cells(weapon, target, orientation, board.size()) {
        let before: Vec<bool> = board.ships().iter().map(|s| s.is_sunk()).collect();
        let Some(state) = board.strike(coord) else {
            continue;
        };
        cells.push(CellOutcome {
            coordinate: coord,
            state,
        });

        if state == CellState::Sunk {
            for (ship, was_sunk) in board.ships().iter().zip(before) {
                if ship.is_sunk() && !was_sunk && !sunk.iter().any(|s| s.id == ship.id()) {
                    sunk.push(SunkShip {
                        id: ship.id().to_string(),
                        kind: ship.kind(),
                    });
                }
            }
        }
    }

    AttackResult {
        weapon,
        target,
        orientation,
        cells,
        sunk,
        game_over: !board.has_live_segments(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Ship;

    fn c(s: &str) -> Coordinate {
        s.parse().unwrap()
    }

    fn place(board: &mut Board, kind: ShipType, id: &str, cells: &[&str]) {
        let cells = cells.iter().map(|s| c(s)).collect();
        board.place_ship(Ship::new(kind, id, cells)).unwrap();
    }

    #[test]
    fn test_line_barrage_hits_destroyer_segment() {
        // Destroyer vertical in column C, rows 5..7.
        let mut board = Board::new(8);
        place(&mut board, ShipType::Destroyer, "DS-A", &["C5", "C6", "C7"]);
        place(&mut board, ShipType::PatrolBoat, "PB-A", &["H1", "H2"]);

        let result = resolve_attack(
            &mut board,
            WeaponType::LineBarrage,
            Coordinate::new(5, 2),
            Orientation::Horizontal,
        );

        let states: Vec<_> = result.cells.iter().map(|o| (o.coordinate, o.state)).collect();
        assert_eq!(
            states,
            vec![
                (Coordinate::new(5, 1), CellState::Miss),
                (Coordinate::new(5, 2), CellState::Hit),
                (Coordinate::new(5, 3), CellState::Miss),
            ]
        );
        assert_eq!(result.hit_count(), 1);
        assert_eq!(result.miss_count(), 2);
        assert!(result.sunk.is_empty());
        assert!(!result.game_over);
    }

    #[test]
    fn test_nuke_sinks_two_ships_once_each() {
        let mut board = Board::new(8);
        place(&mut board, ShipType::PatrolBoat, "PB-A", &["A1", "B1"]);
        place(&mut board, ShipType::PatrolBoat, "PB-B", &["A3", "B3"]);
        place(&mut board, ShipType::Submarine, "SUB-A", &["H6", "H7", "H8"]);

        let result = resolve_attack(
            &mut board,
            WeaponType::Nuke,
            c("B2"),
            Orientation::Horizontal,
        );

        assert_eq!(result.cells.len(), 9);
        let ids: Vec<&str> = result.sunk.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["PB-A", "PB-B"]);
        assert_eq!(result.hit_count(), 4);
        assert!(!result.game_over);
    }

    #[test]
    fn test_previously_sunk_ship_not_reported_again() {
        let mut board = Board::new(8);
        place(&mut board, ShipType::PatrolBoat, "PB-A", &["A1", "B1"]);
        place(&mut board, ShipType::PatrolBoat, "PB-B", &["H8", "H7"]);
        board.strike(c("A1"));
        board.strike(c("B1"));

        let result = resolve_attack(
            &mut board,
            WeaponType::StandardShot,
            c("A1"),
            Orientation::Horizontal,
        );
        assert_eq!(result.cells[0].state, CellState::Sunk);
        assert!(result.sunk.is_empty());
    }

    #[test]
    fn test_last_ship_ends_game() {
        let mut board = Board::new(8);
        place(&mut board, ShipType::PatrolBoat, "PB-A", &["A1", "B1"]);

        let result = resolve_attack(
            &mut board,
            WeaponType::CrossBomber,
            c("A1"),
            Orientation::Horizontal,
        );
        assert_eq!(result.cells.len(), 3);
        assert_eq!(
            result.sunk,
            vec![SunkShip {
                id: "PB-A".into(),
                kind: ShipType::PatrolBoat
            }]
        );
        assert!(result.game_over);
    }
}
