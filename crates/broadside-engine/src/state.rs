//! The two-player match state machine.
//!
//! ```text
//! Lobby ──setup──→ Setup ──boards placed──→ InProgress ──→ GameOver
//!   ↑                │                          │
//!   └──placement─────┘            last ship sunk, forfeit, or disconnect
//!       failure
//! ```

use std::collections::VecDeque;
use std::fmt;

use rand::Rng;

use crate::{
    AttackRejection, AttackResult, Board, CooldownTracker, Coordinate, FleetPlacer, GameMode,
    Orientation, SetupError, WeaponType, resolve_attack,
};

/// Most recent log lines kept by a match.
pub const LOG_CAPACITY: usize = 20;

// ---------------------------------------------------------------------------
// Slot
// ---------------------------------------------------------------------------

/// One of the two player seats. `First` moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    First,
    Second,
}

impl Slot {
    pub const BOTH: [Self; 2] = [Self::First, Self::Second];

    pub fn index(self) -> usize {
        match self {
            Self::First => 0,
            Self::Second => 1,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::First),
            1 => Some(Self::Second),
            _ => None,
        }
    }

    /// The opposing seat.
    pub fn other(self) -> Self {
        match self {
            Self::First => Self::Second,
            Self::Second => Self::First,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.index() + 1)
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Lifecycle phase of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    /// Seats filling up.
    #[default]
    Lobby,
    /// Fleets being placed.
    Setup,
    /// Players trading strikes.
    InProgress,
    /// A winner has been decided.
    GameOver,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lobby => write!(f, "LOBBY"),
            Self::Setup => write!(f, "SETUP"),
            Self::InProgress => write!(f, "IN_PROGRESS"),
            Self::GameOver => write!(f, "GAME_OVER"),
        }
    }
}

// ---------------------------------------------------------------------------
// PlayerState
// ---------------------------------------------------------------------------

/// Running totals for one player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerStats {
    /// Cells covered by this player's strikes.
    pub shots_fired: u32,
    /// Of those, cells that landed on a ship.
    pub shots_hit: u32,
    pub turns_taken: u32,
}

impl PlayerStats {
    /// Hits as a percentage of cells fired on. Zero before the first shot.
    pub fn hit_rate(&self) -> f64 {
        if self.shots_fired == 0 {
            return 0.0;
        }
        f64::from(self.shots_hit) / f64::from(self.shots_fired) * 100.0
    }
}

/// A seated player once the match has started.
#[derive(Debug, Clone)]
pub struct PlayerState {
    name: String,
    board: Board,
    cooldowns: CooldownTracker,
    stats: PlayerStats,
}

impl PlayerState {
    fn new(name: String, board: Board) -> Self {
        Self {
            name,
            board,
            cooldowns: CooldownTracker::new(),
            stats: PlayerStats::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// This player's own board, ships included.
    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn cooldowns(&self) -> &CooldownTracker {
        &self.cooldowns
    }

    pub fn stats(&self) -> &PlayerStats {
        &self.stats
    }

    pub fn ships_lost(&self) -> usize {
        self.board.sunk_count()
    }

    pub fn total_ships(&self) -> usize {
        self.board.ships().len()
    }

    pub fn available_weapons(&self) -> Vec<WeaponType> {
        self.cooldowns.available(&self.board)
    }
}

// ---------------------------------------------------------------------------
// MatchState
// ---------------------------------------------------------------------------

/// Authoritative state of one match.
///
/// All moves go through here. Illegal moves come back as
/// [`AttackRejection`] and leave the state untouched.
#[derive(Debug, Clone)]
pub struct MatchState {
    phase: Phase,
    mode: Option<GameMode>,
    names: [Option<String>; 2],
    players: Option<[PlayerState; 2]>,
    current: Slot,
    turn: u32,
    winner: Option<Slot>,
    log: VecDeque<String>,
    placer: FleetPlacer,
}

impl Default for MatchState {
    fn default() -> Self {
        Self::new(FleetPlacer::default())
    }
}

impl MatchState {
    pub fn new(placer: FleetPlacer) -> Self {
        Self {
            phase: Phase::Lobby,
            mode: None,
            names: [None, None],
            players: None,
            current: Slot::First,
            turn: 0,
            winner: None,
            log: VecDeque::with_capacity(LOG_CAPACITY),
            placer,
        }
    }

    // -- lobby ---------------------------------------------------------------

    /// Seats a player in the first free slot. `None` if both seats are taken
    /// or the match has left the lobby.
    pub fn add_player(&mut self, name: impl Into<String>) -> Option<Slot> {
        if self.phase != Phase::Lobby {
            return None;
        }
        let slot = Slot::BOTH
            .into_iter()
            .find(|s| self.names[s.index()].is_none())?;
        let name = name.into();
        tracing::info!(%slot, name = %name, "player seated");
        self.names[slot.index()] = Some(name);
        Some(slot)
    }

    /// Both seats taken.
    pub fn is_full(&self) -> bool {
        self.names.iter().all(Option::is_some)
    }

    // -- setup ---------------------------------------------------------------

    /// Places both fleets for `mode` and starts the match with
    /// [`Slot::First`] to move on turn 1.
    ///
    /// On a placement failure the match drops back to the lobby and the
    /// error is returned.
    pub fn setup<R: Rng + ?Sized>(
        &mut self,
        mode: GameMode,
        rng: &mut R,
    ) -> Result<(), SetupError> {
        if self.phase != Phase::Lobby {
            return Err(SetupError::WrongPhase(self.phase));
        }
        let [Some(first), Some(second)] = self.names.clone() else {
            return Err(SetupError::NotEnoughPlayers);
        };

        self.phase = Phase::Setup;
        self.mode = Some(mode);

        let boards = self
            .placer
            .place(mode, rng)
            .and_then(|a| self.placer.place(mode, rng).map(|b| (a, b)));
        let (board_a, board_b) = match boards {
            Ok(boards) => boards,
            Err(e) => {
                tracing::error!(%mode, error = %e, "fleet placement failed");
                self.phase = Phase::Lobby;
                self.mode = None;
                return Err(e);
            }
        };

        let mut players = [
            PlayerState::new(first, board_a),
            PlayerState::new(second, board_b),
        ];
        self.current = Slot::First;
        self.turn = 1;
        self.winner = None;
        players[self.current.index()].cooldowns.tick();
        self.players = Some(players);
        self.phase = Phase::InProgress;

        self.push_log(format!("Game started! Mode: {mode}"));
        let opener = self.name(self.current).unwrap_or_default().to_string();
        self.push_log(format!("{opener} goes first."));

        tracing::info!(%mode, grid = mode.grid_size(), "match started");
        Ok(())
    }

    // -- in progress ---------------------------------------------------------

    /// Fires `weapon` at `target` for `slot`.
    ///
    /// Refused when the match isn't running, it isn't `slot`'s turn, the
    /// weapon is unavailable, or the target is off the grid. On success the
    /// attacker's cooldown and stats are updated, the strike is logged, and
    /// either the match ends or the turn passes to the other seat.
    pub fn try_attack(
        &mut self,
        slot: Slot,
        weapon: WeaponType,
        target: Coordinate,
        orientation: Orientation,
    ) -> Result<AttackResult, AttackRejection> {
        let rejection = self.check_attack(slot, weapon, target);
        if let Err(reason) = &rejection {
            tracing::warn!(%slot, %weapon, %target, %reason, "attack rejected");
        }
        rejection?;

        let Some(players) = self.players.as_mut() else {
            return Err(AttackRejection::NotInProgress(self.phase));
        };
        let (attacker, defender) = split_pair(players, slot);

        let result = resolve_attack(&mut defender.board, weapon, target, orientation);
        attacker.cooldowns.activate(weapon);
        attacker.stats.shots_fired += count(result.cells.len());
        attacker.stats.shots_hit += count(result.hit_count());
        attacker.stats.turns_taken += 1;

        let attacker_name = attacker.name.clone();
        let defender_name = defender.name.clone();

        self.push_log(format!("{attacker_name} fired {weapon} at {target}"));
        match result.hit_count() {
            0 => self.push_log("  → All miss!".to_string()),
            hits => self.push_log(format!("  → {hits} hit(s)!")),
        }
        for ship in &result.sunk {
            self.push_log(format!(
                "  → {defender_name}'s {} ({}) SUNK!",
                ship.kind, ship.id
            ));
        }

        if result.game_over {
            self.phase = Phase::GameOver;
            self.winner = Some(slot);
            self.push_log(format!("{attacker_name} wins the game!"));
            tracing::info!(winner = %attacker_name, turn = self.turn, "match over");
        } else {
            self.advance_turn();
        }
        Ok(result)
    }

    /// [`Self::try_attack`] without the reason.
    pub fn execute_attack(
        &mut self,
        slot: Slot,
        weapon: WeaponType,
        target: Coordinate,
        orientation: Orientation,
    ) -> Option<AttackResult> {
        self.try_attack(slot, weapon, target, orientation).ok()
    }

    fn check_attack(
        &self,
        slot: Slot,
        weapon: WeaponType,
        target: Coordinate,
    ) -> Result<(), AttackRejection> {
        if self.phase != Phase::InProgress {
            return Err(AttackRejection::NotInProgress(self.phase));
        }
        if slot != self.current {
            return Err(AttackRejection::NotYourTurn);
        }
        let attacker = self
            .player(slot)
            .ok_or(AttackRejection::NotInProgress(self.phase))?;
        if !attacker.cooldowns.is_available(weapon, &attacker.board) {
            return Err(AttackRejection::WeaponUnavailable(weapon));
        }
        if !target.is_within(attacker.board.size()) {
            return Err(AttackRejection::OutOfBounds(target));
        }
        Ok(())
    }

    fn advance_turn(&mut self) {
        self.current = self.current.other();
        self.turn += 1;
        if let Some(players) = self.players.as_mut() {
            players[self.current.index()].cooldowns.tick();
        }
    }

    // -- ending --------------------------------------------------------------

    /// `slot` gives up. Returns `true` if this ended a running match.
    pub fn forfeit(&mut self, slot: Slot) -> bool {
        self.concede(slot, "forfeited", "wins by forfeit!")
    }

    /// `slot` dropped off.
    ///
    /// A running match is won by the other seat and `true` is returned. In
    /// the lobby the seat is simply freed.
    pub fn player_disconnected(&mut self, slot: Slot) -> bool {
        match self.phase {
            Phase::InProgress => self.concede(slot, "disconnected", "wins by disconnect!"),
            Phase::Lobby => {
                self.names[slot.index()] = None;
                false
            }
            _ => false,
        }
    }

    fn concede(&mut self, loser: Slot, did: &str, outcome: &str) -> bool {
        if self.phase != Phase::InProgress {
            return false;
        }
        let winner = loser.other();
        self.phase = Phase::GameOver;
        self.winner = Some(winner);

        let loser_name = self.name(loser).unwrap_or_default().to_string();
        let winner_name = self.name(winner).unwrap_or_default().to_string();
        self.push_log(format!("{loser_name} {did}."));
        self.push_log(format!("{winner_name} {outcome}"));
        tracing::info!(loser = %loser_name, winner = %winner_name, reason = did, "match conceded");
        true
    }

    // -- log -----------------------------------------------------------------

    fn push_log(&mut self, line: String) {
        if self.log.len() == LOG_CAPACITY {
            self.log.pop_front();
        }
        self.log.push_back(line);
    }

    /// The last `n` log lines, oldest first.
    pub fn recent_log(&self, n: usize) -> Vec<String> {
        let skip = self.log.len().saturating_sub(n);
        self.log.iter().skip(skip).cloned().collect()
    }

    pub fn log(&self) -> impl Iterator<Item = &str> {
        self.log.iter().map(String::as_str)
    }

    // -- accessors -----------------------------------------------------------

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn mode(&self) -> Option<GameMode> {
        self.mode
    }

    /// Name seated in `slot`, before or after setup.
    pub fn name(&self, slot: Slot) -> Option<&str> {
        self.names[slot.index()].as_deref()
    }

    /// Full player state; only present once the match has started.
    pub fn player(&self, slot: Slot) -> Option<&PlayerState> {
        self.players.as_ref().map(|p| &p[slot.index()])
    }

    /// Seat holding the turn.
    pub fn current_turn(&self) -> Slot {
        self.current
    }

    /// 1 on the opening turn, +1 per accepted attack. 0 before setup.
    pub fn turn_number(&self) -> u32 {
        self.turn
    }

    pub fn winner(&self) -> Option<Slot> {
        self.winner
    }

    pub fn winner_name(&self) -> Option<&str> {
        self.winner.and_then(|s| self.name(s))
    }

    /// Weapons `slot` could fire right now, ignoring whose turn it is.
    pub fn available_weapons(&self, slot: Slot) -> Vec<WeaponType> {
        self.player(slot)
            .map(PlayerState::available_weapons)
            .unwrap_or_default()
    }
}

/// Mutable `(attacker, defender)` borrows out of the seat pair.
fn split_pair(
    players: &mut [PlayerState; 2],
    attacker: Slot,
) -> (&mut PlayerState, &mut PlayerState) {
    let [first, second] = players;
    match attacker {
        Slot::First => (first, second),
        Slot::Second => (second, first),
    }
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
