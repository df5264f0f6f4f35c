//! Per-player weapon readiness.

use crate::{Board, ShipType, WeaponType};

/// Remaining cooldown turns for each weapon, for one player.
///
/// Every weapon has a counter from construction; counters start at zero and
/// never go below it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CooldownTracker {
    remaining: [u32; WeaponType::COUNT],
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start of the owner's turn: every positive counter drops by one.
    pub fn tick(&mut self) {
        for turns in &mut self.remaining {
            *turns = turns.saturating_sub(1);
        }
    }

    /// The weapon was just fired; lock it for its full cooldown.
    pub fn activate(&mut self, weapon: WeaponType) {
        self.remaining[weapon.index()] = weapon.cooldown();
    }

    pub fn remaining(&self, weapon: WeaponType) -> u32 {
        self.remaining[weapon.index()]
    }

    pub fn is_ready(&self, weapon: WeaponType) -> bool {
        self.remaining(weapon) == 0
    }

    /// Whether the owner of `board` may fire `weapon` right now.
    ///
    /// The Standard Shot only needs one ship afloat. Every other weapon needs
    /// its counter at zero and a surviving ship of the class that grants it.
    pub fn is_available(&self, weapon: WeaponType, board: &Board) -> bool {
        if weapon == WeaponType::StandardShot {
            return !board.all_sunk();
        }
        self.is_ready(weapon)
            && ShipType::ALL
                .iter()
                .filter(|kind| kind.weapon() == weapon)
                .any(|&kind| board.alive_of_type(kind) > 0)
    }

    /// Every weapon available now, in catalog order.
    pub fn available(&self, board: &Board) -> Vec<WeaponType> {
        WeaponType::ALL
            .into_iter()
            .filter(|&w| self.is_available(w, board))
            .collect()
    }
}
