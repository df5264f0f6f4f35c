//! One player's grid and fleet.

use crate::{BoardError, CellState, Coordinate, Ship, ShipType};

/// An `N×N` grid of [`CellState`] plus the ships placed on it.
///
/// A cell reads `Ship`, `Hit`, or `Sunk` exactly when one ship occupies it.
/// [`Board::place_ship`] refuses overlaps, so no two ships ever share a cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    size: usize,
    grid: Vec<CellState>,
    ships: Vec<Ship>,
}

impl Board {
    /// An empty `size×size` board.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            grid: vec![CellState::Empty; size * size],
            ships: Vec::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// The state at `coord`, or `None` off the grid.
    pub fn cell(&self, coord: Coordinate) -> Option<CellState> {
        self.index(coord).map(|i| self.grid[i])
    }

    pub fn ships(&self) -> &[Ship] {
        &self.ships
    }

    pub fn ship_at(&self, coord: Coordinate) -> Option<&Ship> {
        self.ships.iter().find(|s| s.occupies(coord))
    }

    /// Whether a ship could go on `cells`: every cell in bounds and empty,
    /// and no existing ship within one cell in any of the eight directions.
    pub fn can_place(&self, cells: &[Coordinate]) -> bool {
        cells.iter().all(|&cell| {
            self.cell(cell) == Some(CellState::Empty)
                && !self.neighbours(cell).any(|n| self.grid[n].is_occupied())
        })
    }

    /// Puts `ship` on the board, marking its cells `Ship`.
    ///
    /// Only bounds and overlap are checked here. The spacing rule is the
    /// placer's business, so hand-built boards may put ships side by side.
    pub fn place_ship(&mut self, ship: Ship) -> Result<(), BoardError> {
        for &cell in ship.cells() {
            match self.cell(cell) {
                None => return Err(BoardError::OutOfBounds(cell)),
                Some(state) if state.is_occupied() => return Err(BoardError::Overlap(cell)),
                Some(_) => {}
            }
        }
        for &cell in ship.cells() {
            if let Some(i) = self.index(cell) {
                self.grid[i] = CellState::Ship;
            }
        }
        self.ships.push(ship);
        Ok(())
    }

    /// Fires on one cell and returns what it became.
    ///
    /// `Empty` turns to `Miss`. `Ship` turns to `Hit`, and if that was the
    /// ship's last unstruck cell every cell of the ship becomes `Sunk` and
    /// `Sunk` is returned. Cells already fired on are returned unchanged.
    /// Returns `None` for a coordinate off the grid.
    pub fn strike(&mut self, coord: Coordinate) -> Option<CellState> {
        let i = self.index(coord)?;
        let outcome = match self.grid[i] {
            CellState::Empty => {
                self.grid[i] = CellState::Miss;
                CellState::Miss
            }
            CellState::Ship => {
                self.grid[i] = CellState::Hit;
                let Some(ship) = self.ships.iter_mut().find(|s| s.occupies(coord)) else {
                    return Some(CellState::Hit);
                };
                ship.hit(coord);
                if !ship.is_sunk() {
                    return Some(CellState::Hit);
                }
                let cells = ship.cells().to_vec();
                for cell in cells {
                    if let Some(j) = self.index(cell) {
                        self.grid[j] = CellState::Sunk;
                    }
                }
                CellState::Sunk
            }
            attacked => attacked,
        };
        Some(outcome)
    }

    /// True once every ship is sunk. A board with no ships counts as sunk.
    pub fn all_sunk(&self) -> bool {
        self.ships.iter().all(Ship::is_sunk)
    }

    /// True while at least one ship cell is still unstruck.
    pub fn has_live_segments(&self) -> bool {
        self.grid.contains(&CellState::Ship)
    }

    /// Ships of `kind` still afloat.
    pub fn alive_of_type(&self, kind: ShipType) -> usize {
        self.ships
            .iter()
            .filter(|s| s.kind() == kind && !s.is_sunk())
            .count()
    }

    pub fn sunk_count(&self) -> usize {
        self.ships.iter().filter(|s| s.is_sunk()).count()
    }

    /// The grid as rows, top to bottom.
    pub fn rows(&self) -> Vec<Vec<CellState>> {
        self.grid.chunks(self.size.max(1)).map(<[_]>::to_vec).collect()
    }

    /// The grid as the opponent sees it: unstruck ship cells read `Empty`.
    pub fn fog_view(&self) -> Vec<Vec<CellState>> {
        self.grid
            .chunks(self.size.max(1))
            .map(|row| row.iter().map(|c| c.fogged()).collect())
            .collect()
    }

    fn index(&self, coord: Coordinate) -> Option<usize> {
        coord
            .is_within(self.size)
            .then(|| coord.row() * self.size + coord.col())
    }

    /// Grid indices of `coord` and its in-bounds 8-neighbourhood.
    fn neighbours(&self, coord: Coordinate) -> impl Iterator<Item = usize> + '_ {
        (-1isize..=1)
            .flat_map(move |dr| (-1isize..=1).map(move |dc| (dr, dc)))
            .filter_map(move |(dr, dc)| coord.offset(dr, dc))
            .filter_map(|c| self.index(c))
    }
}
