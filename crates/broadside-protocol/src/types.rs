//! Everything that travels on the wire.

use std::fmt;

use broadside_engine::{
    CellOutcome, CellState, Coordinate, GameMode, ShipType, SunkShip, WeaponType,
};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Identifies one client connection for as long as it stays open.
///
/// Serializes as the bare number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ClientCommand
// ---------------------------------------------------------------------------

/// A request from a player.
///
/// `#[serde(tag = "type")]` gives the flat shape clients send:
/// `{"type": "select_mode", "mode": "BLITZ"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Enter matchmaking under `username`.
    Join { username: String },

    /// Vote for a game mode by name (`BLITZ`, `Strike`, ...).
    SelectMode { mode: String },

    /// Fire a weapon. `target` is a cell like `B5`; `orientation` only
    /// matters for the Line Barrage and defaults to horizontal.
    Attack {
        weapon: String,
        target: String,
        #[serde(default)]
        orientation: Option<String>,
    },

    /// Give up the current match.
    Forfeit,

    /// Answer the rematch prompt.
    PlayAgain { answer: bool },
}

// ---------------------------------------------------------------------------
// View records
// ---------------------------------------------------------------------------

/// One mode on offer in `mode_select`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeInfo {
    pub mode: GameMode,
    pub name: String,
    pub grid_size: usize,
    pub ship_count: usize,
}

impl From<GameMode> for ModeInfo {
    fn from(mode: GameMode) -> Self {
        Self {
            mode,
            name: mode.display_name().to_string(),
            grid_size: mode.grid_size(),
            ship_count: mode.ship_count(),
        }
    }
}

/// Where one of your own ships sits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipView {
    pub id: String,
    pub kind: ShipType,
    pub cells: Vec<Coordinate>,
}

/// Health of one of your own ships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetEntry {
    pub id: String,
    pub kind: ShipType,
    pub health: usize,
    pub max_health: usize,
    pub sunk: bool,
}

/// Readiness of one weapon, listed for every weapon in catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponStatus {
    pub weapon: WeaponType,
    pub name: String,
    pub description: String,
    /// Turns until the cooldown clears. 0 when ready.
    pub cooldown: u32,
    /// Ready and backed by a surviving ship.
    pub available: bool,
    /// The attack must say `HORIZONTAL` or `VERTICAL`.
    pub needs_orientation: bool,
}

/// End-of-match numbers for one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsView {
    pub username: String,
    pub shots_fired: u32,
    pub shots_hit: u32,
    /// Percentage, 0 to 100.
    pub hit_rate: f64,
    pub turns_taken: u32,
    pub ships_lost: usize,
    pub total_ships: usize,
}

/// What a strike did, shared by both sides' views of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrikeReport {
    pub weapon: WeaponType,
    pub target: Coordinate,
    pub cells: Vec<CellOutcome>,
    pub sunk: Vec<SunkShip>,
    pub hits: usize,
    pub misses: usize,
    pub game_over: bool,
}

// ---------------------------------------------------------------------------
// ServerEvent
// ---------------------------------------------------------------------------

/// A message from the server to one player.
///
/// Boards are rows of [`CellState`], top to bottom. A board you receive
/// about your opponent is always fogged: it never contains `SHIP`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// You're queued; nobody to play yet.
    LobbyWaiting { message: String },

    /// You have an opponent; vote for a mode.
    ModeSelect { opponent: String, modes: Vec<ModeInfo> },

    /// Fleets are placed. `ships` and `board` are your own.
    GameStart {
        mode: GameMode,
        grid_size: usize,
        opponent: String,
        ships: Vec<ShipView>,
        board: Vec<Vec<CellState>>,
    },

    /// Your move. Fire before `timeout_secs` run out or forfeit.
    YourTurn {
        turn: u32,
        weapons: Vec<WeaponStatus>,
        fleet: Vec<FleetEntry>,
        log: Vec<String>,
        timeout_secs: u64,
    },

    /// Your opponent is moving.
    WaitTurn {
        turn: u32,
        opponent: String,
        weapons: Vec<WeaponStatus>,
        fleet: Vec<FleetEntry>,
        log: Vec<String>,
    },

    /// Outcome of your strike, with the opponent's board as you now see it.
    AttackResult {
        strike: StrikeReport,
        enemy_board: Vec<Vec<CellState>>,
        fleet: Vec<FleetEntry>,
        log: Vec<String>,
    },

    /// You were fired on. `board` is your own, unfogged.
    IncomingAttack {
        attacker: String,
        strike: StrikeReport,
        board: Vec<Vec<CellState>>,
        fleet: Vec<FleetEntry>,
        log: Vec<String>,
    },

    /// The match is decided.
    GameOver {
        winner: String,
        you_won: bool,
        stats: Vec<StatsView>,
        log: Vec<String>,
    },

    /// Play again? Answer with `play_again`.
    PlayAgainPrompt,

    /// Your answer is in; waiting on the other player.
    PlayAgainWaiting,

    /// The other player left.
    OpponentDisconnected { opponent: String },

    /// Your last command was refused.
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_display_and_serde() {
        let id = ConnectionId::new(7);
        assert_eq!(id.to_string(), "conn-7");
        assert_eq!(serde_json::to_string(&id).unwrap(), "7");
        assert_eq!(id.into_inner(), 7);
    }

    #[test]
    fn test_commands_use_snake_case_tags() {
        let cmd: ClientCommand =
            serde_json::from_str(r#"{"type":"select_mode","mode":"WAR"}"#).unwrap();
        assert_eq!(cmd, ClientCommand::SelectMode { mode: "WAR".into() });

        let cmd: ClientCommand = serde_json::from_str(r#"{"type":"forfeit"}"#).unwrap();
        assert_eq!(cmd, ClientCommand::Forfeit);

        let cmd: ClientCommand =
            serde_json::from_str(r#"{"type":"play_again","answer":false}"#).unwrap();
        assert_eq!(cmd, ClientCommand::PlayAgain { answer: false });
    }

    #[test]
    fn test_attack_orientation_is_optional() {
        let json = r#"{"type":"attack","weapon":"LINE_BARRAGE","target":"B5","orientation":"V"}"#;
        let cmd: ClientCommand = serde_json::from_str(json).unwrap();
        assert_eq!(
            cmd,
            ClientCommand::Attack {
                weapon: "LINE_BARRAGE".into(),
                target: "B5".into(),
                orientation: Some("V".into()),
            }
        );
    }

    #[test]
    fn test_join_requires_username() {
        assert!(serde_json::from_str::<ClientCommand>(r#"{"type":"join"}"#).is_err());
    }

    #[test]
    fn test_unit_events_are_bare_tags() {
        let json = serde_json::to_value(&ServerEvent::PlayAgainPrompt).unwrap();
        assert_eq!(json, serde_json::json!({"type": "play_again_prompt"}));
    }

    #[test]
    fn test_mode_select_lists_catalog() {
        let event = ServerEvent::ModeSelect {
            opponent: "Bob".into(),
            modes: GameMode::ALL.into_iter().map(ModeInfo::from).collect(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "mode_select");
        assert_eq!(json["modes"][0]["mode"], "BLITZ");
        assert_eq!(json["modes"][2]["grid_size"], 16);
        assert_eq!(json["modes"][1]["ship_count"], 5);
    }

    #[test]
    fn test_strike_report_shape() {
        let report = StrikeReport {
            weapon: WeaponType::LineBarrage,
            target: Coordinate::new(4, 1),
            cells: vec![CellOutcome {
                coordinate: Coordinate::new(4, 1),
                state: CellState::Sunk,
            }],
            sunk: vec![SunkShip {
                id: "PB-A".into(),
                kind: ShipType::PatrolBoat,
            }],
            hits: 1,
            misses: 0,
            game_over: false,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["weapon"], "LINE_BARRAGE");
        assert_eq!(json["target"], "B5");
        assert_eq!(json["cells"][0]["coordinate"], "B5");
        assert_eq!(json["cells"][0]["state"], "SUNK");
        assert_eq!(json["sunk"][0]["kind"], "PATROL_BOAT");
    }

    #[test]
    fn test_fogged_board_serializes_states() {
        let event = ServerEvent::AttackResult {
            strike: StrikeReport {
                weapon: WeaponType::StandardShot,
                target: Coordinate::new(0, 0),
                cells: vec![],
                sunk: vec![],
                hits: 0,
                misses: 1,
                game_over: false,
            },
            enemy_board: vec![vec![CellState::Miss, CellState::Empty]],
            fleet: vec![],
            log: vec!["Alice fired Standard Shot at A1".into()],
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["enemy_board"][0][0], "MISS");
        assert_eq!(json["log"][0], "Alice fired Standard Shot at A1");
    }
}
