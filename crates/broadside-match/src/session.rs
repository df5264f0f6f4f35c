//! One match between two connections, from mode vote to rematch.

use std::fmt;

use broadside_engine::{
    AttackRejection, AttackResult, Coordinate, FleetPlacer, GameMode, MatchState, Orientation,
    Phase, SetupError, Slot, WeaponType,
};
use broadside_protocol::ConnectionId;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc;

use crate::{MatchConfig, TurnTimer};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Unique id of a session within this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}", self.0)
    }
}

/// Posted by a session's [`TurnTimer`] when `slot` let turn `turn` run out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnExpired {
    pub session: SessionId,
    pub slot: Slot,
    pub turn: u32,
}

/// How a rematch vote settled once both players answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RematchDecision {
    /// Both said yes. The session has been reset for a new match.
    Rematch,
    /// Someone said no. `wanted_rematch` lists who said yes.
    Declined { wanted_rematch: Vec<Slot> },
}

// ---------------------------------------------------------------------------
// MatchSession
// ---------------------------------------------------------------------------

/// Orchestrates one [`MatchState`]: who sits where, the mode vote, the turn
/// timeout, and the rematch vote.
///
/// The timer never mutates the session. It posts a [`TurnExpired`] notice
/// and whoever drains the channel calls [`MatchSession::handle_turn_expired`].
pub struct MatchSession {
    id: SessionId,
    state: MatchState,
    members: [Option<ConnectionId>; 2],
    mode_votes: [Option<GameMode>; 2],
    rematch_votes: [Option<bool>; 2],
    timer: TurnTimer,
    expiry_tx: mpsc::UnboundedSender<TurnExpired>,
    config: MatchConfig,
    rng: StdRng,
}

impl MatchSession {
    pub fn new(
        id: SessionId,
        config: MatchConfig,
        expiry_tx: mpsc::UnboundedSender<TurnExpired>,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            id,
            state: MatchState::new(FleetPlacer::new(config.placement)),
            members: [None, None],
            mode_votes: [None, None],
            rematch_votes: [None, None],
            timer: TurnTimer::new(),
            expiry_tx,
            config,
            rng,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    // -- membership ----------------------------------------------------------

    /// Seats `conn` as `username`. `None` if both seats are taken.
    pub fn add_player(&mut self, conn: ConnectionId, username: &str) -> Option<Slot> {
        let slot = self.state.add_player(username)?;
        self.members[slot.index()] = Some(conn);
        tracing::info!(session = %self.id, %conn, %slot, "player joined session");
        Some(slot)
    }

    pub fn slot_of(&self, conn: ConnectionId) -> Option<Slot> {
        Slot::BOTH
            .into_iter()
            .find(|s| self.members[s.index()] == Some(conn))
    }

    pub fn member(&self, slot: Slot) -> Option<ConnectionId> {
        self.members[slot.index()]
    }

    /// Connections still attached, in seat order.
    pub fn members(&self) -> Vec<ConnectionId> {
        self.members.iter().flatten().copied().collect()
    }

    pub fn is_full(&self) -> bool {
        self.state.is_full()
    }

    // -- mode vote -----------------------------------------------------------

    /// Records `slot`'s mode vote. Once both seats have voted, returns the
    /// chosen mode: the shared pick, or a coin flip between the two picks.
    ///
    /// The vote resolves once per match; votes after that, or outside the
    /// lobby phase, are ignored.
    pub fn vote_mode(&mut self, slot: Slot, mode: GameMode) -> Option<GameMode> {
        if self.state.phase() != Phase::Lobby || self.mode_votes.iter().all(Option::is_some) {
            return None;
        }
        self.mode_votes[slot.index()] = Some(mode);
        tracing::info!(session = %self.id, %slot, %mode, "mode vote");

        let [Some(a), Some(b)] = self.mode_votes else {
            return None;
        };
        let chosen = if a == b || self.rng.random_bool(0.5) { a } else { b };
        tracing::info!(session = %self.id, %chosen, "mode resolved");
        Some(chosen)
    }

    // -- play ----------------------------------------------------------------

    /// Places both fleets and arms the first turn timeout.
    pub fn start(&mut self, mode: GameMode) -> Result<(), SetupError> {
        self.state.setup(mode, &mut self.rng)?;
        self.arm_timer();
        Ok(())
    }

    /// Forwards an attack to the match.
    ///
    /// An accepted attack restarts the timeout for whoever moves next, or
    /// leaves it off if the match just ended. A rejected attack leaves the
    /// running timeout alone.
    pub fn attack(
        &mut self,
        slot: Slot,
        weapon: WeaponType,
        target: Coordinate,
        orientation: Orientation,
    ) -> Result<AttackResult, AttackRejection> {
        let result = self.state.try_attack(slot, weapon, target, orientation)?;
        self.timer.cancel();
        if self.state.phase() == Phase::InProgress {
            self.arm_timer();
        }
        Ok(result)
    }

    /// `slot` gives up. Returns `true` if that ended a running match.
    pub fn forfeit(&mut self, slot: Slot) -> bool {
        let ended = self.state.forfeit(slot);
        if ended {
            self.timer.cancel();
        }
        ended
    }

    /// `slot`'s connection is gone. Frees the seat; returns `true` if that
    /// ended a running match.
    pub fn disconnect(&mut self, slot: Slot) -> bool {
        let ended = self.state.player_disconnected(slot);
        self.members[slot.index()] = None;
        self.timer.cancel();
        ended
    }

    /// Applies a timeout notice. Only acts if `notice.slot` still holds turn
    /// `notice.turn` of a running match; anything else is stale and ignored.
    pub fn handle_turn_expired(&mut self, notice: &TurnExpired) -> bool {
        let current = notice.session == self.id
            && self.state.phase() == Phase::InProgress
            && self.state.current_turn() == notice.slot
            && self.state.turn_number() == notice.turn;
        if !current {
            tracing::debug!(
                session = %self.id,
                slot = %notice.slot,
                turn = notice.turn,
                "stale turn timeout ignored"
            );
            return false;
        }
        self.forfeit(notice.slot)
    }

    pub fn timer_armed(&self) -> bool {
        self.timer.is_armed()
    }

    fn arm_timer(&mut self) {
        let notice = TurnExpired {
            session: self.id,
            slot: self.state.current_turn(),
            turn: self.state.turn_number(),
        };
        self.timer
            .arm(self.config.turn_timeout, self.expiry_tx.clone(), notice);
    }

    // -- rematch -------------------------------------------------------------

    /// Records `slot`'s rematch answer. `None` until both have answered or
    /// when no finished match is on the table.
    ///
    /// When both say yes the session is reset with the same players.
    pub fn vote_rematch(&mut self, slot: Slot, wants: bool) -> Option<RematchDecision> {
        if self.state.phase() != Phase::GameOver {
            return None;
        }
        self.rematch_votes[slot.index()] = Some(wants);
        tracing::info!(session = %self.id, %slot, wants, "rematch vote");

        let [Some(a), Some(b)] = self.rematch_votes else {
            return None;
        };
        if a && b {
            self.reset();
            return Some(RematchDecision::Rematch);
        }
        let wanted_rematch = Slot::BOTH
            .into_iter()
            .filter(|s| self.rematch_votes[s.index()] == Some(true))
            .collect();
        Some(RematchDecision::Declined { wanted_rematch })
    }

    /// Fresh match, same players: votes cleared and timer off.
    fn reset(&mut self) {
        let names: Vec<String> = Slot::BOTH
            .into_iter()
            .filter_map(|s| self.state.name(s).map(str::to_string))
            .collect();
        self.timer.cancel();
        self.state = MatchState::new(FleetPlacer::new(self.config.placement));
        for name in names {
            self.state.add_player(name);
        }
        self.mode_votes = [None, None];
        self.rematch_votes = [None, None];
        tracing::info!(session = %self.id, "session reset for rematch");
    }

    /// Stops the turn timer for good; used when the session is torn down.
    pub fn shutdown(&mut self) {
        self.timer.cancel();
    }
}

impl fmt::Debug for MatchSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchSession")
            .field("id", &self.id)
            .field("phase", &self.state.phase())
            .field("members", &self.members)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn seeded() -> MatchConfig {
        MatchConfig {
            seed: Some(17),
            ..MatchConfig::default()
        }
    }

    fn session_with_two() -> (MatchSession, mpsc::UnboundedReceiver<TurnExpired>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut session = MatchSession::new(SessionId::new(1), seeded(), tx);
        session.add_player(ConnectionId::new(1), "Alice");
        session.add_player(ConnectionId::new(2), "Bob");
        (session, rx)
    }

    /// A cell on `defender`'s board with nothing on it.
    fn open_water(session: &MatchSession, defender: Slot) -> Coordinate {
        let board = session.state().player(defender).unwrap().board();
        (0..board.size())
            .flat_map(|r| (0..board.size()).map(move |c| Coordinate::new(r, c)))
            .find(|c| board.ship_at(*c).is_none() && !board.cell(*c).unwrap().is_attacked())
            .unwrap()
    }

    #[test]
    fn test_session_id_display() {
        assert_eq!(SessionId::new(4).to_string(), "S-4");
    }

    #[tokio::test]
    async fn test_membership() {
        let (session, _rx) = session_with_two();
        assert!(session.is_full());
        assert_eq!(session.slot_of(ConnectionId::new(2)), Some(Slot::Second));
        assert_eq!(session.slot_of(ConnectionId::new(9)), None);
        assert_eq!(session.member(Slot::First), Some(ConnectionId::new(1)));
        assert_eq!(
            session.members(),
            vec![ConnectionId::new(1), ConnectionId::new(2)]
        );
    }

    #[tokio::test]
    async fn test_matching_votes_resolve_to_that_mode() {
        let (mut session, _rx) = session_with_two();
        assert_eq!(session.vote_mode(Slot::First, GameMode::Strike), None);
        assert_eq!(
            session.vote_mode(Slot::Second, GameMode::Strike),
            Some(GameMode::Strike)
        );
    }

    #[tokio::test]
    async fn test_split_vote_is_a_fair_coin() {
        const TRIALS: u64 = 1000;
        let mut blitz = 0;
        for seed in 0..TRIALS {
            let (tx, _rx) = mpsc::unbounded_channel();
            let config = MatchConfig {
                seed: Some(seed),
                ..MatchConfig::default()
            };
            let mut session = MatchSession::new(SessionId::new(1), config, tx);
            session.add_player(ConnectionId::new(1), "Alice");
            session.add_player(ConnectionId::new(2), "Bob");
            session.vote_mode(Slot::First, GameMode::Blitz);
            match session.vote_mode(Slot::Second, GameMode::War) {
                Some(GameMode::Blitz) => blitz += 1,
                Some(GameMode::War) => {}
                other => panic!("split vote resolved to {other:?}"),
            }
        }
        assert!(
            (400..=600).contains(&blitz),
            "Blitz won {blitz} of {TRIALS} split votes"
        );
    }

    #[tokio::test]
    async fn test_vote_resolves_once() {
        let (mut session, _rx) = session_with_two();
        session.vote_mode(Slot::First, GameMode::Blitz);
        session.vote_mode(Slot::Second, GameMode::Blitz);
        assert_eq!(session.vote_mode(Slot::First, GameMode::War), None);
    }

    #[tokio::test]
    async fn test_start_arms_timer() {
        let (mut session, _rx) = session_with_two();
        session.start(GameMode::Blitz).unwrap();
        assert_eq!(session.state().phase(), Phase::InProgress);
        assert!(session.timer_armed());
    }

    #[tokio::test]
    async fn test_rejected_attack_keeps_turn_and_timer() {
        let (mut session, _rx) = session_with_two();
        session.start(GameMode::Blitz).unwrap();
        let err = session
            .attack(
                Slot::Second,
                WeaponType::StandardShot,
                Coordinate::new(0, 0),
                Orientation::Horizontal,
            )
            .unwrap_err();
        assert_eq!(err, AttackRejection::NotYourTurn);
        assert!(session.timer_armed());
        assert_eq!(session.state().current_turn(), Slot::First);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_forfeits_current_player() {
        let (mut session, mut rx) = session_with_two();
        session.start(GameMode::Blitz).unwrap();

        tokio::time::sleep(Duration::from_secs(61)).await;
        let notice = rx.recv().await.unwrap();
        assert_eq!(
            notice,
            TurnExpired {
                session: SessionId::new(1),
                slot: Slot::First,
                turn: 1
            }
        );

        assert!(session.handle_turn_expired(&notice));
        assert_eq!(session.state().phase(), Phase::GameOver);
        assert_eq!(session.state().winner(), Some(Slot::Second));
    }

    #[tokio::test(start_paused = true)]
    async fn test_move_rearms_for_next_player() {
        let (mut session, mut rx) = session_with_two();
        session.start(GameMode::Blitz).unwrap();

        tokio::time::sleep(Duration::from_secs(30)).await;
        let target = open_water(&session, Slot::Second);
        session
            .attack(Slot::First, WeaponType::StandardShot, target, Orientation::Horizontal)
            .unwrap();

        // Alice's original deadline passes without a notice.
        tokio::time::sleep(Duration::from_secs(31)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_secs(30)).await;
        let notice = rx.recv().await.unwrap();
        assert_eq!(notice.slot, Slot::Second);
        assert_eq!(notice.turn, 2);
    }

    #[tokio::test]
    async fn test_stale_notice_is_ignored() {
        let (mut session, _rx) = session_with_two();
        session.start(GameMode::Blitz).unwrap();
        let target = open_water(&session, Slot::Second);
        session
            .attack(Slot::First, WeaponType::StandardShot, target, Orientation::Horizontal)
            .unwrap();

        let stale = TurnExpired {
            session: SessionId::new(1),
            slot: Slot::First,
            turn: 1,
        };
        assert!(!session.handle_turn_expired(&stale));
        assert_eq!(session.state().phase(), Phase::InProgress);
    }

    #[tokio::test]
    async fn test_forfeit_disarms_timer() {
        let (mut session, _rx) = session_with_two();
        session.start(GameMode::Blitz).unwrap();
        assert!(session.forfeit(Slot::Second));
        assert!(!session.timer_armed());
        assert_eq!(session.state().winner_name(), Some("Alice"));
    }

    #[tokio::test]
    async fn test_rematch_only_after_game_over() {
        let (mut session, _rx) = session_with_two();
        session.start(GameMode::Blitz).unwrap();
        assert_eq!(session.vote_rematch(Slot::First, true), None);
    }

    #[tokio::test]
    async fn test_both_yes_resets_with_same_names() {
        let (mut session, _rx) = session_with_two();
        session.start(GameMode::Blitz).unwrap();
        session.forfeit(Slot::First);

        assert_eq!(session.vote_rematch(Slot::First, true), None);
        assert_eq!(
            session.vote_rematch(Slot::Second, true),
            Some(RematchDecision::Rematch)
        );
        assert_eq!(session.state().phase(), Phase::Lobby);
        assert_eq!(session.state().name(Slot::First), Some("Alice"));
        assert_eq!(session.state().name(Slot::Second), Some("Bob"));
        assert_eq!(session.members().len(), 2);

        // Mode vote is open again.
        session.vote_mode(Slot::First, GameMode::War);
        assert_eq!(
            session.vote_mode(Slot::Second, GameMode::War),
            Some(GameMode::War)
        );
    }

    #[tokio::test]
    async fn test_decline_reports_yes_voters() {
        let (mut session, _rx) = session_with_two();
        session.start(GameMode::Blitz).unwrap();
        session.forfeit(Slot::First);

        session.vote_rematch(Slot::First, true);
        assert_eq!(
            session.vote_rematch(Slot::Second, false),
            Some(RematchDecision::Declined {
                wanted_rematch: vec![Slot::First]
            })
        );
        assert_eq!(session.state().phase(), Phase::GameOver);
    }

    #[tokio::test]
    async fn test_disconnect_mid_match() {
        let (mut session, _rx) = session_with_two();
        session.start(GameMode::Blitz).unwrap();
        assert!(session.disconnect(Slot::First));
        assert_eq!(session.state().winner(), Some(Slot::Second));
        assert_eq!(session.member(Slot::First), None);
        assert!(!session.timer_armed());
    }
}
