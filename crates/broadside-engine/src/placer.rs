//! Randomized fleet layout.

use std::cmp::Reverse;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::{Board, Coordinate, GameMode, Orientation, SetupError, Ship, ShipType};

/// Retry budgets for [`FleetPlacer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementConfig {
    /// Random positions tried for one ship before the board is thrown away.
    /// Default: 100.
    pub per_ship_attempts: u32,
    /// Fresh boards tried before giving up. Default: 50.
    pub board_attempts: u32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            per_ship_attempts: 100,
            board_attempts: 50,
        }
    }
}

/// Lays out a mode's fleet at random, keeping a one-cell gap around every
/// ship.
///
/// The fleet is shuffled, then stable-sorted largest first, so ships of the
/// same size land in a random order while big ships still get the open
/// board. If any ship runs out of attempts, the whole board starts over.
#[derive(Debug, Clone, Copy, Default)]
pub struct FleetPlacer {
    config: PlacementConfig,
}

impl FleetPlacer {
    pub fn new(config: PlacementConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    /// Builds a fully populated board for `mode`.
    ///
    /// The same `rng` state always yields the same layout.
    pub fn place<R: Rng + ?Sized>(&self, mode: GameMode, rng: &mut R) -> Result<Board, SetupError> {
        for attempt in 1..=self.config.board_attempts {
            if let Some(board) = self.try_board(mode, rng) {
                tracing::debug!(%mode, attempt, "fleet placed");
                return Ok(board);
            }
            tracing::debug!(%mode, attempt, "placement attempt failed, restarting board");
        }
        Err(SetupError::PlacementExhausted {
            mode,
            attempts: self.config.board_attempts,
        })
    }

    fn try_board<R: Rng + ?Sized>(&self, mode: GameMode, rng: &mut R) -> Option<Board> {
        let mut board = Board::new(mode.grid_size());
        let mut fleet = mode.fleet().to_vec();
        fleet.shuffle(rng);
        fleet.sort_by_key(|kind| Reverse(kind.tile_count()));

        let mut instances = [0usize; ShipType::ALL.len()];
        for kind in fleet {
            let slot = ShipType::ALL.iter().position(|k| *k == kind)?;
            instances[slot] += 1;
            let id = Ship::make_id(kind, instances[slot]);

            let cells = (0..self.config.per_ship_attempts)
                .filter_map(|_| random_cells(kind, board.size(), rng))
                .find(|cells| board.can_place(cells))?;
            board.place_ship(Ship::new(kind, id, cells)).ok()?;
        }
        Some(board)
    }
}

/// A random in-bounds footprint for `kind`.
///
/// Horizontal ships run their length along the columns and their width down
/// the rows; vertical ships the other way round. Returns `None` if the ship
/// can't fit the grid in the chosen orientation.
fn random_cells<R: Rng + ?Sized>(
    kind: ShipType,
    grid_size: usize,
    rng: &mut R,
) -> Option<Vec<Coordinate>> {
    let orientation = if rng.random_bool(0.5) {
        Orientation::Horizontal
    } else {
        Orientation::Vertical
    };
    let (length, width) = (kind.length(), kind.width());
    let (rows, cols) = match orientation {
        Orientation::Horizontal => (width, length),
        Orientation::Vertical => (length, width),
    };

    let max_row = grid_size.checked_sub(rows)?;
    let max_col = grid_size.checked_sub(cols)?;
    let top = rng.random_range(0..=max_row);
    let left = rng.random_range(0..=max_col);

    let mut cells = Vec::with_capacity(length * width);
    for l in 0..length {
        for w in 0..width {
            let cell = match orientation {
                Orientation::Horizontal => Coordinate::new(top + w, left + l),
                Orientation::Vertical => Coordinate::new(top + l, left + w),
            };
            cells.push(cell);
        }
    }
    Some(cells)
}
