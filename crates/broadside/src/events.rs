//! Builders turning engine state into outbound events.
//!
//! Everything a player sees about their opponent's board goes through
//! [`Board::fog_view`](broadside_engine::Board::fog_view); only a player's
//! own board is sent unfogged.

use broadside_engine::{AttackResult, GameMode, MatchState, PlayerState, Slot, WeaponType};
use broadside_protocol::{
    FleetEntry, ModeInfo, ServerEvent, ShipView, StatsView, StrikeReport, WeaponStatus,
};

pub fn lobby_waiting() -> ServerEvent {
    ServerEvent::LobbyWaiting {
        message: "Waiting for an opponent to join...".to_string(),
    }
}

pub fn mode_select(opponent: &str) -> ServerEvent {
    ServerEvent::ModeSelect {
        opponent: opponent.to_string(),
        modes: GameMode::ALL.into_iter().map(ModeInfo::from).collect(),
    }
}

pub fn error(message: impl Into<String>) -> ServerEvent {
    ServerEvent::Error {
        message: message.into(),
    }
}

/// `game_start` for `slot`: own ships and board, opponent's name.
pub fn game_start(state: &MatchState, slot: Slot) -> Option<ServerEvent> {
    let player = state.player(slot)?;
    let mode = state.mode()?;
    let board = player.board();
    Some(ServerEvent::GameStart {
        mode,
        grid_size: board.size(),
        opponent: opponent_name(state, slot),
        ships: board
            .ships()
            .iter()
            .map(|s| ShipView {
                id: s.id().to_string(),
                kind: s.kind(),
                cells: s.cells().to_vec(),
            })
            .collect(),
        board: board.rows(),
    })
}

/// `your_turn` or `wait_turn` for `slot`, depending on who holds the turn.
pub fn turn(
    state: &MatchState,
    slot: Slot,
    timeout_secs: u64,
    log_lines: usize,
) -> Option<ServerEvent> {
    let player = state.player(slot)?;
    let event = if state.current_turn() == slot {
        ServerEvent::YourTurn {
            turn: state.turn_number(),
            weapons: weapon_statuses(player),
            fleet: fleet(player),
            log: state.recent_log(log_lines),
            timeout_secs,
        }
    } else {
        ServerEvent::WaitTurn {
            turn: state.turn_number(),
            opponent: opponent_name(state, slot),
            weapons: weapon_statuses(player),
            fleet: fleet(player),
            log: state.recent_log(log_lines),
        }
    };
    Some(event)
}

/// `attack_result` for the attacker: the strike plus the defender's board,
/// fogged.
pub fn attack_result(
    state: &MatchState,
    attacker: Slot,
    result: &AttackResult,
    log_lines: usize,
) -> Option<ServerEvent> {
    let player = state.player(attacker)?;
    let defender = state.player(attacker.other())?;
    Some(ServerEvent::AttackResult {
        strike: strike_report(result),
        enemy_board: defender.board().fog_view(),
        fleet: fleet(player),
        log: state.recent_log(log_lines),
    })
}

/// `incoming_attack` for the defender: the strike plus their own board.
pub fn incoming_attack(
    state: &MatchState,
    defender: Slot,
    result: &AttackResult,
    log_lines: usize,
) -> Option<ServerEvent> {
    let player = state.player(defender)?;
    Some(ServerEvent::IncomingAttack {
        attacker: opponent_name(state, defender),
        strike: strike_report(result),
        board: player.board().rows(),
        fleet: fleet(player),
        log: state.recent_log(log_lines),
    })
}

/// `game_over` for `slot`, with both players' stats.
pub fn game_over(state: &MatchState, slot: Slot, log_lines: usize) -> Option<ServerEvent> {
    let winner = state.winner()?;
    let stats = Slot::BOTH
        .into_iter()
        .filter_map(|s| state.player(s))
        .map(stats_view)
        .collect();
    Some(ServerEvent::GameOver {
        winner: state.winner_name().unwrap_or_default().to_string(),
        you_won: winner == slot,
        stats,
        log: state.recent_log(log_lines),
    })
}

pub fn strike_report(result: &AttackResult) -> StrikeReport {
    StrikeReport {
        weapon: result.weapon,
        target: result.target,
        cells: result.cells.clone(),
        sunk: result.sunk.clone(),
        hits: result.hit_count(),
        misses: result.miss_count(),
        game_over: result.game_over,
    }
}

/// Every weapon, in catalog order, with its cooldown and availability.
pub fn weapon_statuses(player: &PlayerState) -> Vec<WeaponStatus> {
    let available = player.available_weapons();
    WeaponType::ALL
        .into_iter()
        .map(|weapon| WeaponStatus {
            weapon,
            name: weapon.display_name().to_string(),
            description: weapon.description().to_string(),
            cooldown: player.cooldowns().remaining(weapon),
            available: available.contains(&weapon),
            needs_orientation: weapon.needs_orientation(),
        })
        .collect()
}

pub fn fleet(player: &PlayerState) -> Vec<FleetEntry> {
    player
        .board()
        .ships()
        .iter()
        .map(|s| FleetEntry {
            id: s.id().to_string(),
            kind: s.kind(),
            health: s.remaining_health(),
            max_health: s.max_health(),
            sunk: s.is_sunk(),
        })
        .collect()
}

fn stats_view(player: &PlayerState) -> StatsView {
    let stats = player.stats();
    StatsView {
        username: player.name().to_string(),
        shots_fired: stats.shots_fired,
        shots_hit: stats.shots_hit,
        hit_rate: stats.hit_rate(),
        turns_taken: stats.turns_taken,
        ships_lost: player.ships_lost(),
        total_ships: player.total_ships(),
    }
}

fn opponent_name(state: &MatchState, slot: Slot) -> String {
    state.name(slot.other()).unwrap_or_default().to_string()
}
