//! Command dispatch: turns each inbound command into lobby and session calls
//! and works out who hears about the result.
//!
//! The dispatcher never touches a socket. Every entry point returns the
//! events to send as `(recipient, event)` pairs, in order; the server
//! routes them to the right connection. That keeps the whole game flow
//! testable without a network.
//!
//! Lock order follows the lobby: lobby first, then session. Session guards
//! are dropped before any call back into the lobby.

use broadside_engine::{Coordinate, GameMode, Orientation, Phase, Slot, WeaponType};
use broadside_match::{
    JoinOutcome, Lobby, MatchConfig, MatchSession, RematchDecision, SharedSession, TurnExpired,
};
use broadside_protocol::{ClientCommand, ConnectionId, ServerEvent};
use tokio::sync::mpsc;

use crate::{CommandError, events};

/// Events to deliver, addressed and in send order.
pub type Outbound = Vec<(ConnectionId, ServerEvent)>;

/// Routes commands, disconnects, and timeouts through the lobby.
pub struct Dispatcher {
    lobby: Lobby,
}

impl Dispatcher {
    /// Creates a dispatcher over a fresh lobby. Turn timeouts arrive on the
    /// returned receiver and should be fed back through
    /// [`turn_expired`](Self::turn_expired).
    pub fn new(config: MatchConfig) -> (Self, mpsc::UnboundedReceiver<TurnExpired>) {
        let (lobby, expiries) = Lobby::new(config);
        (Self { lobby }, expiries)
    }

    pub fn lobby(&self) -> &Lobby {
        &self.lobby
    }

    /// Handles one command from `conn`. A refused command yields a single
    /// `error` event back to the sender.
    pub async fn handle(&self, conn: ConnectionId, command: ClientCommand) -> Outbound {
        let result = match command {
            ClientCommand::Join { username } => self.join(conn, &username).await,
            ClientCommand::SelectMode { mode } => self.select_mode(conn, &mode).await,
            ClientCommand::Attack {
                weapon,
                target,
                orientation,
            } => {
                self.attack(conn, &weapon, &target, orientation.as_deref())
                    .await
            }
            ClientCommand::Forfeit => self.forfeit(conn).await,
            ClientCommand::PlayAgain { answer } => self.play_again(conn, answer).await,
        };
        result.unwrap_or_else(|e| {
            tracing::debug!(%conn, error = %e, "command refused");
            vec![(conn, events::error(e.to_string()))]
        })
    }

    /// `conn` is gone. The opponent hears about it, wins a running match,
    /// and the session is torn down.
    pub async fn disconnected(&self, conn: ConnectionId) -> Outbound {
        let Some(departure) = self.lobby.remove(conn).await else {
            return Vec::new();
        };

        let mut out = Vec::new();
        {
            let session = departure.session.lock().await;
            let remaining = departure.slot.other();
            if let Some(opponent) = session.member(remaining) {
                let name = session.state().name(departure.slot).unwrap_or("Opponent");
                out.push((
                    opponent,
                    ServerEvent::OpponentDisconnected {
                        opponent: name.to_string(),
                    },
                ));
                if departure.ended_match {
                    let lines = self.lobby.config().log_lines;
                    if let Some(event) = events::game_over(session.state(), remaining, lines) {
                        out.push((opponent, event));
                    }
                }
            }
        }
        self.lobby.cleanup(departure.session_id).await;
        out
    }

    /// Applies a turn timeout. Stale notices produce nothing.
    pub async fn turn_expired(&self, notice: TurnExpired) -> Outbound {
        let Some(shared) = self.lobby.session(notice.session).await else {
            return Vec::new();
        };
        let mut session = shared.lock().await;
        if !session.handle_turn_expired(&notice) {
            return Vec::new();
        }
        tracing::info!(
            session = %notice.session,
            slot = %notice.slot,
            turn = notice.turn,
            "turn timed out"
        );
        self.game_over_events(&session)
    }

    // -- commands ------------------------------------------------------------

    async fn join(&self, conn: ConnectionId, username: &str) -> Result<Outbound, CommandError> {
        let joined = self.lobby.join(conn, username).await?;
        Ok(self.seated(conn, joined).await)
    }

    async fn select_mode(&self, conn: ConnectionId, mode: &str) -> Result<Outbound, CommandError> {
        let mode: GameMode = mode.parse()?;
        let shared = self.seat(conn).await?;
        let mut session = shared.lock().await;
        let slot = session.slot_of(conn).ok_or(CommandError::NotSeated)?;
        if !session.is_full() {
            return Err(CommandError::NoOpponent);
        }
        let Some(chosen) = session.vote_mode(slot, mode) else {
            return Ok(Vec::new());
        };

        if let Err(e) = session.start(chosen) {
            let session_id = session.id();
            tracing::error!(session = %session_id, error = %e, "match setup failed");
            let members = session.members();
            drop(session);
            self.lobby.cleanup(session_id).await;
            return Ok(members
                .into_iter()
                .map(|member| (member, events::error(e.to_string())))
                .collect());
        }

        let mut out: Outbound = Slot::BOTH
            .into_iter()
            .filter_map(|s| Some((session.member(s)?, events::game_start(session.state(), s)?)))
            .collect();
        out.extend(self.turn_events(&session));
        Ok(out)
    }

    async fn attack(
        &self,
        conn: ConnectionId,
        weapon: &str,
        target: &str,
        orientation: Option<&str>,
    ) -> Result<Outbound, CommandError> {
        let weapon: WeaponType = weapon.parse()?;
        let target: Coordinate = target.parse()?;
        let orientation = orientation
            .map(str::parse::<Orientation>)
            .transpose()?
            .unwrap_or_default();

        let shared = self.seat(conn).await?;
        let mut session = shared.lock().await;
        let slot = session.slot_of(conn).ok_or(CommandError::NotSeated)?;
        let result = session.attack(slot, weapon, target, orientation)?;

        let lines = self.lobby.config().log_lines;
        let state = session.state();
        let defender = slot.other();
        let mut out = Vec::new();
        if let (Some(member), Some(event)) = (
            session.member(slot),
            events::attack_result(state, slot, &result, lines),
        ) {
            out.push((member, event));
        }
        if let (Some(member), Some(event)) = (
            session.member(defender),
            events::incoming_attack(state, defender, &result, lines),
        ) {
            out.push((member, event));
        }

        if result.game_over {
            out.extend(self.game_over_events(&session));
        } else {
            out.extend(self.turn_events(&session));
        }
        Ok(out)
    }

    async fn forfeit(&self, conn: ConnectionId) -> Result<Outbound, CommandError> {
        let shared = self.seat(conn).await?;
        let mut session = shared.lock().await;
        let slot = session.slot_of(conn).ok_or(CommandError::NotSeated)?;
        if !session.forfeit(slot) {
            return Err(CommandError::NoMatch);
        }
        Ok(self.game_over_events(&session))
    }

    async fn play_again(&self, conn: ConnectionId, answer: bool) -> Result<Outbound, CommandError> {
        let shared = self.seat(conn).await?;
        let mut session = shared.lock().await;
        let slot = session.slot_of(conn).ok_or(CommandError::NotSeated)?;
        if session.state().phase() != Phase::GameOver {
            return Err(CommandError::NotFinished);
        }

        match session.vote_rematch(slot, answer) {
            None => Ok(vec![(conn, ServerEvent::PlayAgainWaiting)]),
            Some(RematchDecision::Rematch) => Ok(Self::mode_selects(&session)),
            Some(RematchDecision::Declined { wanted_rematch }) => {
                let keen: Vec<(ConnectionId, String)> = wanted_rematch
                    .into_iter()
                    .filter_map(|s| {
                        let name = session.state().name(s)?;
                        Some((session.member(s)?, name.to_string()))
                    })
                    .collect();
                let session_id = session.id();
                drop(session);
                self.lobby.cleanup(session_id).await;

                let mut out = Vec::new();
                for (member, name) in keen {
                    match self.lobby.requeue(member, &name).await {
                        Ok(joined) => out.extend(self.seated(member, joined).await),
                        Err(e) => out.push((member, events::error(e.to_string()))),
                    }
                }
                Ok(out)
            }
        }
    }

    // -- helpers -------------------------------------------------------------

    async fn seat(&self, conn: ConnectionId) -> Result<SharedSession, CommandError> {
        self.lobby
            .session_for(conn)
            .await
            .ok_or(CommandError::NotSeated)
    }

    /// What a fresh seat hears: `lobby_waiting` alone, or `mode_select` for
    /// both once paired.
    async fn seated(&self, conn: ConnectionId, joined: JoinOutcome) -> Outbound {
        if !joined.ready {
            return vec![(conn, events::lobby_waiting())];
        }
        let session = joined.session.lock().await;
        Self::mode_selects(&session)
    }

    fn mode_selects(session: &MatchSession) -> Outbound {
        Slot::BOTH
            .into_iter()
            .filter_map(|slot| {
                let member = session.member(slot)?;
                let opponent = session.state().name(slot.other())?;
                Some((member, events::mode_select(opponent)))
            })
            .collect()
    }

    fn turn_events(&self, session: &MatchSession) -> Outbound {
        let config = self.lobby.config();
        let timeout_secs = config.turn_timeout.as_secs();
        Slot::BOTH
            .into_iter()
            .filter_map(|slot| {
                let event = events::turn(session.state(), slot, timeout_secs, config.log_lines)?;
                Some((session.member(slot)?, event))
            })
            .collect()
    }

    fn game_over_events(&self, session: &MatchSession) -> Outbound {
        let lines = self.lobby.config().log_lines;
        let mut out = Vec::new();
        for slot in Slot::BOTH {
            let Some(member) = session.member(slot) else {
                continue;
            };
            if let Some(event) = events::game_over(session.state(), slot, lines) {
                out.push((member, event));
                out.push((member, ServerEvent::PlayAgainPrompt));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn dispatcher() -> Dispatcher {
        let config = MatchConfig {
            seed: Some(17),
            ..MatchConfig::default()
        };
        Dispatcher::new(config).0
    }

    fn conn(n: u64) -> ConnectionId {
        ConnectionId::new(n)
    }

    fn join(name: &str) -> ClientCommand {
        ClientCommand::Join {
            username: name.to_string(),
        }
    }

    fn select(mode: &str) -> ClientCommand {
        ClientCommand::SelectMode {
            mode: mode.to_string(),
        }
    }

    fn shot(target: &str) -> ClientCommand {
        ClientCommand::Attack {
            weapon: "STANDARD_SHOT".to_string(),
            target: target.to_string(),
            orientation: None,
        }
    }

    fn error_message(out: &Outbound) -> &str {
        match out.as_slice() {
            [(_, ServerEvent::Error { message })] => message,
            other => panic!("expected a single error, got {other:?}"),
        }
    }

    /// Pairs conn 1 (Alice) and conn 2 (Bob) and starts a Blitz match.
    async fn started() -> (Dispatcher, Outbound) {
        let d = dispatcher();
        d.handle(conn(1), join("Alice")).await;
        d.handle(conn(2), join("Bob")).await;
        d.handle(conn(1), select("BLITZ")).await;
        let out = d.handle(conn(2), select("BLITZ")).await;
        (d, out)
    }

    #[tokio::test]
    async fn test_join_waits_then_pairs() {
        let d = dispatcher();
        let out = d.handle(conn(1), join("Alice")).await;
        assert!(matches!(
            out.as_slice(),
            [(c, ServerEvent::LobbyWaiting { .. })] if *c == conn(1)
        ));

        let out = d.handle(conn(2), join("Bob")).await;
        assert_eq!(out.len(), 2);
        let ServerEvent::ModeSelect { opponent, modes } = &out[0].1 else {
            panic!("expected mode_select, got {:?}", out[0].1);
        };
        assert_eq!(out[0].0, conn(1));
        assert_eq!(opponent, "Bob");
        assert_eq!(modes.len(), 3);
        assert!(matches!(
            &out[1].1,
            ServerEvent::ModeSelect { opponent, .. } if opponent == "Alice"
        ));
    }

    #[tokio::test]
    async fn test_join_twice_is_an_error() {
        let d = dispatcher();
        d.handle(conn(1), join("Alice")).await;
        let out = d.handle(conn(1), join("Alice")).await;
        assert!(error_message(&out).contains("already joined"));
    }

    #[tokio::test]
    async fn test_select_mode_before_pairing_is_an_error() {
        let d = dispatcher();
        d.handle(conn(1), join("Alice")).await;
        let out = d.handle(conn(1), select("BLITZ")).await;
        assert_eq!(error_message(&out), "still waiting for an opponent");
    }

    #[tokio::test]
    async fn test_unknown_mode_is_an_error() {
        let d = dispatcher();
        d.handle(conn(1), join("Alice")).await;
        d.handle(conn(2), join("Bob")).await;
        let out = d.handle(conn(1), select("CHAOS")).await;
        assert!(error_message(&out).contains("unknown game mode"));
    }

    #[tokio::test]
    async fn test_mode_vote_starts_match() {
        let d = dispatcher();
        d.handle(conn(1), join("Alice")).await;
        d.handle(conn(2), join("Bob")).await;
        assert!(d.handle(conn(1), select("STRIKE")).await.is_empty());

        let out = d.handle(conn(2), select("STRIKE")).await;
        assert_eq!(out.len(), 4);
        assert!(matches!(
            &out[0],
            (c, ServerEvent::GameStart { mode: GameMode::Strike, grid_size: 12, .. })
                if *c == conn(1)
        ));
        assert!(matches!(&out[1], (c, ServerEvent::GameStart { .. }) if *c == conn(2)));
        assert!(matches!(
            &out[2],
            (c, ServerEvent::YourTurn { turn: 1, timeout_secs: 60, .. }) if *c == conn(1)
        ));
        assert!(matches!(&out[3], (c, ServerEvent::WaitTurn { .. }) if *c == conn(2)));
    }

    #[tokio::test]
    async fn test_attack_out_of_turn_is_an_error() {
        let (d, _) = started().await;
        let out = d.handle(conn(2), shot("A1")).await;
        assert_eq!(error_message(&out), "it is not your turn");
    }

    #[tokio::test]
    async fn test_attack_with_bad_input_is_an_error() {
        let (d, _) = started().await;
        let bad_weapon = ClientCommand::Attack {
            weapon: "LASER".into(),
            target: "A1".into(),
            orientation: None,
        };
        let out = d.handle(conn(1), bad_weapon).await;
        assert!(error_message(&out).contains("unknown weapon"));
        let out = d.handle(conn(1), shot("Z99")).await;
        assert!(error_message(&out).contains("invalid coordinate"));
        let out = d.handle(conn(1), shot("J10")).await;
        assert!(error_message(&out).contains("outside the grid"));
    }

    #[tokio::test]
    async fn test_attack_reports_to_both_and_passes_turn() {
        let (d, _) = started().await;
        let out = d.handle(conn(1), shot("A1")).await;
        assert_eq!(out.len(), 4);

        let (to, ServerEvent::AttackResult { strike, .. }) = &out[0] else {
            panic!("expected attack_result, got {:?}", out[0].1);
        };
        assert_eq!(*to, conn(1));
        assert_eq!(strike.cells.len(), 1);
        assert_eq!(strike.hits + strike.misses, 1);
        assert!(matches!(
            &out[1],
            (c, ServerEvent::IncomingAttack { attacker, .. })
                if *c == conn(2) && attacker == "Alice"
        ));
        assert!(matches!(&out[2], (c, ServerEvent::WaitTurn { turn: 2, .. }) if *c == conn(1)));
        assert!(matches!(&out[3], (c, ServerEvent::YourTurn { turn: 2, .. }) if *c == conn(2)));
    }

    #[tokio::test]
    async fn test_forfeit_ends_match_for_both() {
        let (d, _) = started().await;
        let out = d.handle(conn(2), ClientCommand::Forfeit).await;
        assert_eq!(out.len(), 4);
        assert!(matches!(
            &out[0],
            (c, ServerEvent::GameOver { winner, you_won: true, .. })
                if *c == conn(1) && winner == "Alice"
        ));
        assert!(matches!(&out[1], (c, ServerEvent::PlayAgainPrompt) if *c == conn(1)));
        assert!(matches!(
            &out[2],
            (c, ServerEvent::GameOver { you_won: false, .. }) if *c == conn(2)
        ));
        assert!(matches!(&out[3], (c, ServerEvent::PlayAgainPrompt) if *c == conn(2)));

        let again = d.handle(conn(2), ClientCommand::Forfeit).await;
        assert_eq!(error_message(&again), "no match in progress");
    }

    #[tokio::test]
    async fn test_rematch_accepted_returns_to_mode_select() {
        let (d, _) = started().await;
        d.handle(conn(1), ClientCommand::Forfeit).await;

        let out = d.handle(conn(1), ClientCommand::PlayAgain { answer: true }).await;
        assert!(matches!(out.as_slice(), [(c, ServerEvent::PlayAgainWaiting)] if *c == conn(1)));

        let out = d.handle(conn(2), ClientCommand::PlayAgain { answer: true }).await;
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|(_, e)| matches!(e, ServerEvent::ModeSelect { .. })));

        // A fresh vote starts a fresh match.
        d.handle(conn(1), select("BLITZ")).await;
        let out = d.handle(conn(2), select("BLITZ")).await;
        assert!(matches!(&out[0].1, ServerEvent::GameStart { .. }));
    }

    #[tokio::test]
    async fn test_rematch_declined_requeues_keen_player() {
        let (d, _) = started().await;
        d.handle(conn(1), ClientCommand::Forfeit).await;
        d.handle(conn(1), ClientCommand::PlayAgain { answer: false }).await;

        let out = d.handle(conn(2), ClientCommand::PlayAgain { answer: true }).await;
        assert!(matches!(out.as_slice(), [(c, ServerEvent::LobbyWaiting { .. })] if *c == conn(2)));
        assert!(d.lobby().session_for(conn(1)).await.is_none());

        // The declining player can queue up again and meets Bob.
        let out = d.handle(conn(1), join("Alice")).await;
        assert_eq!(out.len(), 2);
        assert!(matches!(
            &out[0],
            (c, ServerEvent::ModeSelect { opponent, .. })
                if *c == conn(2) && opponent == "Alice"
        ));
    }

    #[tokio::test]
    async fn test_play_again_mid_match_is_an_error() {
        let (d, _) = started().await;
        let out = d.handle(conn(1), ClientCommand::PlayAgain { answer: true }).await;
        assert_eq!(error_message(&out), "no finished match to replay");
    }

    #[tokio::test]
    async fn test_commands_without_seat_are_errors() {
        let d = dispatcher();
        let out = d.handle(conn(5), ClientCommand::Forfeit).await;
        assert_eq!(error_message(&out), "you have not joined a game");
    }

    #[tokio::test]
    async fn test_disconnect_mid_match_awards_opponent() {
        let (d, _) = started().await;
        let out = d.disconnected(conn(1)).await;
        assert_eq!(out.len(), 2);
        assert!(matches!(
            &out[0],
            (c, ServerEvent::OpponentDisconnected { opponent })
                if *c == conn(2) && opponent == "Alice"
        ));
        assert!(matches!(
            &out[1],
            (c, ServerEvent::GameOver { you_won: true, .. }) if *c == conn(2)
        ));
        assert_eq!(d.lobby().session_count().await, 0);
        assert!(d.lobby().session_for(conn(2)).await.is_none());
    }

    #[tokio::test]
    async fn test_disconnect_while_waiting_is_silent() {
        let d = dispatcher();
        d.handle(conn(1), join("Alice")).await;
        assert!(d.disconnected(conn(1)).await.is_empty());
        assert!(d.disconnected(conn(1)).await.is_empty());
        assert_eq!(d.lobby().session_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_turn_timeout_forfeits_idle_player() {
        let config = MatchConfig {
            seed: Some(17),
            turn_timeout: Duration::from_secs(5),
            ..MatchConfig::default()
        };
        let (d, mut expiries) = Dispatcher::new(config);
        d.handle(conn(1), join("Alice")).await;
        d.handle(conn(2), join("Bob")).await;
        d.handle(conn(1), select("BLITZ")).await;
        d.handle(conn(2), select("BLITZ")).await;

        tokio::time::sleep(Duration::from_secs(6)).await;
        let notice = expiries.recv().await.unwrap();
        let out = d.turn_expired(notice).await;
        assert!(matches!(
            &out[0],
            (c, ServerEvent::GameOver { winner, you_won: false, .. })
                if *c == conn(1) && winner == "Bob"
        ));

        // Replaying the same notice does nothing.
        assert!(d.turn_expired(notice).await.is_empty());
    }
}
