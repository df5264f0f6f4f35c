//! Weapon strike geometry.

use crate::{Coordinate, Orientation, WeaponType};

/// Cells hit by firing `weapon` at `target` on a `grid_size` grid.
///
/// | weapon | pattern |
/// |---|---|
/// | Standard Shot | the target |
/// | Line Barrage | target and its two neighbours along `orientation` |
/// | Cross Bomber | target plus the four orthogonal neighbours |
/// | Nuke | the 3×3 square centred on the target |
///
/// Cells off the grid are dropped without error, so a strike near an edge
/// simply covers fewer cells. Order is stable: row-major offsets for the
/// square patterns, centre first for the cross.
pub fn affected_cells(
    weapon: WeaponType,
    target: Coordinate,
    orientation: Orientation,
    grid_size: usize,
) -> Vec<Coordinate> {
    let offsets: &[(isize, isize)] = match (weapon, orientation) {
        (WeaponType::StandardShot, _) => &[(0, 0)],
        (WeaponType::LineBarrage, Orientation::Horizontal) => &[(0, -1), (0, 0), (0, 1)],
        (WeaponType::LineBarrage, Orientation::Vertical) => &[(-1, 0), (0, 0), (1, 0)],
        (WeaponType::CrossBomber, _) => &[(0, 0), (-1, 0), (1, 0), (0, -1), (0, 1)],
        (WeaponType::Nuke, _) => &[
            (-1, -1),
            (-1, 0),
            (-1, 1),
            (0, -1),
            (0, 0),
            (0, 1),
            (1, -1),
            (1, 0),
            (1, 1),
        ],
    };

    offsets
        .iter()
        .filter_map(|&(dr, dc)| target.offset(dr, dc))
        .filter(|c| c.is_within(grid_size))
        .collect()
}
