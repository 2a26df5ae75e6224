use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use autobus_core::{
    GameEvent, GameEventBus, GameEventHandler, LeaderboardEntry, LocalRoundState,
    PlayerRegistry, RoundEndReason, RoundPhase, RoundStateMachine, RoundTransition,
    ScoringEngine, generate_room_code, normalize_room_code, random_letter,
};
use autobus_persistence::{KeyValueStore, RoomStore, StoreError};
use autobus_types::{
    Answers, Category, CorrectionMark, Corrections, GameError, Player, PlayerId, RoomCode,
    RoomRecord,
};

use crate::clock::Clock;
use crate::config::{ClientConfig, DEFAULT_POLL_INTERVAL};
use crate::timers::TimerSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameMode {
    /// Local rounds only; nothing is written to the store.
    Solo,
    Online { room_code: RoomCode },
}

impl GameMode {
    pub fn room_code(&self) -> Option<&RoomCode> {
        match self {
            GameMode::Solo => None,
            GameMode::Online { room_code } => Some(room_code),
        }
    }
}

/// Point-in-time copy of everything a front end renders.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub mode: Option<GameMode>,
    pub me: Option<Player>,
    pub is_host: bool,
    pub players: Vec<Player>,
    pub phase: RoundPhase,
    pub current_letter: Option<char>,
    pub time_left: u32,
    pub answers: Answers,
    pub corrections: Corrections,
    pub round_score: Option<u32>,
    pub score_recorded: bool,
    /// Own cumulative score: the room's total online, the session's total solo.
    pub total_score: u32,
}

impl SessionSnapshot {
    pub fn room_code(&self) -> Option<&RoomCode> {
        self.mode.as_ref().and_then(GameMode::room_code)
    }

    pub fn is_playing(&self) -> bool {
        self.phase == RoundPhase::Active
    }

    pub fn completion_percentage(&self) -> u8 {
        ScoringEngine::completion_percentage(&self.answers)
    }

    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        ScoringEngine::leaderboard(&self.players)
    }
}

struct SessionState {
    /// Bumped on every enter and leave; timers stop once it moves on.
    epoch: u64,
    mode: Option<GameMode>,
    me: Option<Player>,
    players: Vec<Player>,
    host_id: Option<PlayerId>,
    round: LocalRoundState,
    solo_total: u32,
    /// Bumped when a local write starts and again when it ends.
    write_generation: u64,
    writes_in_flight: u32,
    events: GameEventBus,
}

impl SessionState {
    fn new() -> Self {
        Self {
            epoch: 0,
            mode: None,
            me: None,
            players: Vec::new(),
            host_id: None,
            round: LocalRoundState::new(),
            solo_total: 0,
            write_generation: 0,
            writes_in_flight: 0,
            events: GameEventBus::new(),
        }
    }

    fn reset(&mut self, mode: Option<GameMode>, me: Option<Player>) -> u64 {
        self.epoch += 1;
        self.mode = mode;
        self.me = me;
        self.players.clear();
        self.host_id = None;
        self.round = LocalRoundState::new();
        self.solo_total = 0;
        self.writes_in_flight = 0;
        self.epoch
    }

    fn room_code(&self) -> Option<RoomCode> {
        self.mode.as_ref().and_then(GameMode::room_code).cloned()
    }

    fn is_host(&self) -> bool {
        match &self.mode {
            Some(GameMode::Solo) => true,
            Some(GameMode::Online { .. }) => self
                .me
                .as_ref()
                .is_some_and(|me| self.host_id.as_ref() == Some(&me.id)),
            None => false,
        }
    }

    fn begin_write(&mut self) {
        self.write_generation += 1;
        self.writes_in_flight += 1;
    }

    fn end_write(&mut self) {
        self.writes_in_flight = self.writes_in_flight.saturating_sub(1);
        self.write_generation += 1;
    }

    /// The room as this client last saw it.
    fn local_record(&self) -> RoomRecord {
        RoomRecord {
            players: self.players.clone(),
            current_letter: self.round.current_letter(),
            host_id: self.host_id.clone(),
            ..RoomRecord::default()
        }
    }

    /// Take the record's player list wholesale. Returns whether it changed.
    fn sync_roster(&mut self, record: &RoomRecord) -> bool {
        self.host_id = PlayerRegistry::host(record)
            .map(|host| host.id.clone())
            .or_else(|| record.host_id.clone());

        if self.players == record.players {
            return false;
        }
        self.players = record.players.clone();
        true
    }

    fn apply_record(&mut self, record: &RoomRecord, now_ms: i64) {
        if self.sync_roster(record) {
            if let Some(room_code) = self.room_code() {
                debug!("Room {} now has {} players", room_code, self.players.len());
                self.events.publish(GameEvent::RosterChanged {
                    room_code,
                    players: self.players.clone(),
                });
            }
        }

        if let Some(transition) = self.round.observe(record, now_ms) {
            self.publish_transition(transition);
        }
    }

    fn publish_transition(&mut self, transition: RoundTransition) {
        let room_code = self.room_code();
        let event = match transition {
            RoundTransition::Started { letter } => GameEvent::RoundStarted { room_code, letter },
            RoundTransition::Ended(reason) => GameEvent::RoundEnded { room_code, reason },
        };
        self.events.publish(event);
    }

    fn total_score(&self) -> u32 {
        match &self.mode {
            Some(GameMode::Solo) => self.solo_total,
            _ => self.own_entry().map(|p| p.score).unwrap_or_default(),
        }
    }

    fn own_entry(&self) -> Option<&Player> {
        let me = self.me.as_ref()?;
        self.players.iter().find(|p| p.id == me.id).or(Some(me))
    }
}

/// State reachable from the background timers.
pub(crate) struct SessionShared {
    rooms: RoomStore,
    clock: Clock,
    poll_interval: Duration,
    state: Mutex<SessionState>,
}

impl SessionShared {
    pub(crate) fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// One fetch of the room. Failures and missing records leave the local
    /// view untouched.
    pub(crate) async fn poll_once(&self, epoch: u64, room_code: &RoomCode) -> ControlFlow<()> {
        let generation = {
            let state = self.state.lock().await;
            if state.epoch != epoch {
                return ControlFlow::Break(());
            }
            state.write_generation
        };

        let fetched = self.rooms.get(room_code).await;

        let mut state = self.state.lock().await;
        if state.epoch != epoch {
            return ControlFlow::Break(());
        }

        match fetched {
            Ok(Some(record)) => {
                if state.writes_in_flight > 0 || state.write_generation != generation {
                    debug!("Discarding poll of {} that raced a local write", room_code);
                } else {
                    state.apply_record(&record, self.clock.now_ms());
                }
            }
            Ok(None) => debug!("Room {} has no record yet", room_code),
            Err(e) => warn!("Polling room {} failed: {}", room_code, e),
        }
        ControlFlow::Continue(())
    }

    pub(crate) async fn tick(&self, epoch: u64) -> ControlFlow<()> {
        let mut state = self.state.lock().await;
        if state.epoch != epoch {
            return ControlFlow::Break(());
        }

        if let Some(reason) = state.round.tick() {
            info!("Time is up");
            state.publish_transition(RoundTransition::Ended(reason));
        }
        ControlFlow::Continue(())
    }
}

/// One player's client: room membership, the local round, and the poll and
/// countdown timers that keep it moving.
///
/// User actions take `&mut self`, so a session runs one action at a time.
/// Dropping the session cancels its timers.
pub struct GameSession {
    shared: Arc<SessionShared>,
    timers: TimerSet,
}

impl GameSession {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_settings(store, DEFAULT_POLL_INTERVAL, Clock::new())
    }

    pub fn from_config(store: Arc<dyn KeyValueStore>, config: &ClientConfig) -> Self {
        Self::with_settings(store, config.poll_interval, Clock::new())
    }

    /// Sessions in one process that share a [`Clock`] agree on round timing
    /// even under a paused test runtime.
    pub fn with_settings(
        store: Arc<dyn KeyValueStore>,
        poll_interval: Duration,
        clock: Clock,
    ) -> Self {
        Self {
            shared: Arc::new(SessionShared {
                rooms: RoomStore::new(store),
                clock,
                poll_interval,
                state: Mutex::new(SessionState::new()),
            }),
            timers: TimerSet::default(),
        }
    }

    pub async fn add_event_handler(&self, handler: Box<dyn GameEventHandler>) {
        self.shared.state.lock().await.events.add_handler(handler);
    }

    /// Write a new room with this player as host, then start polling it.
    /// The current room, if any, is left only once the write succeeds.
    pub async fn create_room(&mut self, name: &str) -> Result<RoomCode, GameError> {
        let (record, host) = PlayerRegistry::create_room(name)?;

        let room_code = generate_room_code(&mut rand::rng());
        self.shared
            .rooms
            .set(&room_code, &record)
            .await
            .map_err(|e| {
                warn!("Failed to create room {}: {}", room_code, e);
                GameError::CreateFailed {
                    message: e.to_string(),
                }
            })?;
        info!("Created room {} as {}", room_code, host.name);
        self.leave().await;

        let mut state = self.shared.state.lock().await;
        let epoch = state.reset(
            Some(GameMode::Online {
                room_code: room_code.clone(),
            }),
            Some(host.clone()),
        );
        state.sync_roster(&record);
        state.events.publish(GameEvent::RoomCreated {
            room_code: room_code.clone(),
            host,
        });
        drop(state);

        self.timers
            .start(&self.shared, epoch, Some(room_code.clone()));
        Ok(room_code)
    }

    /// Append this player to an existing room. The room code is normalised
    /// the way it is typed: trimmed, upper-cased, at most six characters.
    /// On failure the session stays where it was.
    pub async fn join_room(&mut self, room_code: &str, name: &str) -> Result<Player, GameError> {
        let room_code = normalize_room_code(room_code);
        let Some(name) = PlayerRegistry::validate_name(name).filter(|_| !room_code.is_empty())
        else {
            return Err(GameError::NameAndRoomCodeRequired);
        };

        let join_failed = |e: StoreError| {
            warn!("Failed to join room {}: {}", room_code, e);
            GameError::JoinFailed {
                message: e.to_string(),
            }
        };

        let mut record = self
            .shared
            .rooms
            .get(&room_code)
            .await
            .map_err(join_failed)?
            .ok_or_else(|| GameError::RoomNotFound {
                room_code: room_code.clone(),
            })?;

        let player = PlayerRegistry::join(&mut record, &name)?;
        self.shared
            .rooms
            .set(&room_code, &record)
            .await
            .map_err(join_failed)?;
        self.leave().await;

        let now = self.shared.clock.now_ms();
        let mut state = self.shared.state.lock().await;
        let epoch = state.reset(
            Some(GameMode::Online {
                room_code: room_code.clone(),
            }),
            Some(player.clone()),
        );
        state.sync_roster(&record);
        state.events.publish(GameEvent::PlayerJoined {
            room_code: room_code.clone(),
            player: player.clone(),
        });
        // A round may already be running
        if let Some(transition) = state.round.observe(&record, now) {
            state.publish_transition(transition);
        }
        drop(state);

        self.timers.start(&self.shared, epoch, Some(room_code));
        Ok(player)
    }

    /// Play alone: a local round starts immediately.
    pub async fn start_solo(&mut self) -> Result<char, GameError> {
        self.leave().await;

        let letter = random_letter(&mut rand::rng());
        let now = self.shared.clock.now_ms();

        let mut state = self.shared.state.lock().await;
        let epoch = state.reset(Some(GameMode::Solo), None);
        state.round.begin(letter, now)?;
        state.publish_transition(RoundTransition::Started { letter });
        drop(state);

        info!("Solo round started with letter {}", letter);
        self.timers.start(&self.shared, epoch, None);
        Ok(letter)
    }

    /// Host only. Opens a round from the lobby or after a review.
    pub async fn start_round(&mut self) -> Result<char, GameError> {
        self.begin_round(&[RoundPhase::Lobby, RoundPhase::Ended]).await
    }

    /// Host only online, anyone solo. Starts the next round after a review.
    pub async fn new_round(&mut self) -> Result<char, GameError> {
        self.begin_round(&[RoundPhase::Ended]).await
    }

    async fn begin_round(&mut self, allowed: &[RoundPhase]) -> Result<char, GameError> {
        let letter = random_letter(&mut rand::rng());
        let now = self.shared.clock.now_ms();

        let mut state = self.shared.state.lock().await;
        let Some(mode) = state.mode.clone() else {
            return Err(GameError::NotInRoom);
        };
        if !state.is_host() {
            return Err(GameError::NotHost);
        }
        if !allowed.contains(&state.round.phase()) {
            return Err(GameError::InvalidGameState {
                current_state: state.round.phase().to_string(),
            });
        }

        state.round.begin(letter, now)?;
        state.publish_transition(RoundTransition::Started { letter });

        let GameMode::Online { room_code } = mode else {
            info!("Solo round started with letter {}", letter);
            return Ok(letter);
        };
        let fallback = state.local_record();
        state.begin_write();
        drop(state);

        let mut record = match self.shared.rooms.get(&room_code).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                warn!("Room {} has no record; writing local view", room_code);
                fallback
            }
            Err(e) => {
                warn!("Re-reading room {} failed ({}); writing local view", room_code, e);
                fallback
            }
        };
        RoundStateMachine::begin_round(&mut record, letter, now);

        match self.shared.rooms.set(&room_code, &record).await {
            Ok(()) => info!("Round started in room {} with letter {}", room_code, letter),
            Err(e) => error!("Failed to publish round start for room {}: {}", room_code, e),
        }
        self.shared.state.lock().await.end_write();

        Ok(letter)
    }

    /// End the round for this client only.
    pub async fn finish_round(&mut self) -> Result<(), GameError> {
        let mut state = self.shared.state.lock().await;
        if state.mode.is_none() {
            return Err(GameError::NotInRoom);
        }
        state.round.finish()?;
        state.publish_transition(RoundTransition::Ended(RoundEndReason::Finished));
        Ok(())
    }

    pub async fn set_answer(&mut self, category: Category, text: &str) -> Result<(), GameError> {
        self.shared
            .state
            .lock()
            .await
            .round
            .set_answer(category, text)
    }

    pub async fn toggle_correction(
        &mut self,
        category: Category,
    ) -> Result<CorrectionMark, GameError> {
        self.shared
            .state
            .lock()
            .await
            .round
            .toggle_correction(category)
    }

    /// Score the reviewed round and record it. Online, the score is added to
    /// this player's total in a fresh copy of the room, and the host's write
    /// also closes the round for everyone.
    pub async fn calculate_score(&mut self) -> Result<u32, GameError> {
        let mut state = self.shared.state.lock().await;
        let mode = state.mode.clone().ok_or(GameError::NotInRoom)?;
        let round_score = state.round.score()?;

        let GameMode::Online { room_code } = mode else {
            state.round.mark_recorded();
            state.solo_total = state.solo_total.saturating_add(round_score);
            let total = state.solo_total;
            state.events.publish(GameEvent::ScoreRecorded {
                room_code: None,
                player_id: None,
                round_score,
                total,
            });
            return Ok(round_score);
        };

        let player_id = state
            .me
            .as_ref()
            .map(|me| me.id.clone())
            .ok_or(GameError::NotInRoom)?;
        let closes_round = state.is_host();
        state.begin_write();
        drop(state);

        let written = self
            .write_score(&room_code, &player_id, round_score, closes_round)
            .await;

        let mut state = self.shared.state.lock().await;
        state.end_write();
        let record = written?;

        state.round.mark_recorded();
        if state.sync_roster(&record) {
            state.events.publish(GameEvent::RosterChanged {
                room_code: room_code.clone(),
                players: record.players.clone(),
            });
        }
        let total = state.total_score();
        state.events.publish(GameEvent::ScoreRecorded {
            room_code: Some(room_code),
            player_id: Some(player_id),
            round_score,
            total,
        });
        Ok(round_score)
    }

    async fn write_score(
        &self,
        room_code: &RoomCode,
        player_id: &PlayerId,
        points: u32,
        closes_round: bool,
    ) -> Result<RoomRecord, GameError> {
        let sync_failed = |e: StoreError| {
            warn!("Failed to save score in room {}: {}", room_code, e);
            GameError::ScoreSyncFailed {
                message: e.to_string(),
            }
        };

        let mut record = self
            .shared
            .rooms
            .get(room_code)
            .await
            .map_err(sync_failed)?
            .ok_or_else(|| GameError::RoomNotFound {
                room_code: room_code.clone(),
            })?;

        let total = PlayerRegistry::apply_round_score(&mut record, player_id, points)?;
        if closes_round {
            RoundStateMachine::close_round(&mut record);
        }

        self.shared
            .rooms
            .set(room_code, &record)
            .await
            .map_err(sync_failed)?;
        info!(
            "Recorded {} points for {} in room {} (total {})",
            points, player_id, room_code, total
        );
        Ok(record)
    }

    /// Stop both timers and forget the room. The shared record is untouched.
    pub async fn leave(&mut self) {
        let mut state = self.shared.state.lock().await;
        let previous = state.mode.take();
        state.reset(None, None);
        if let Some(GameMode::Online { room_code }) = previous {
            info!("Left room {}", room_code);
            state.events.publish(GameEvent::RoomLeft { room_code });
        }
        drop(state);

        self.timers.cancel();
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.shared.state.lock().await;
        SessionSnapshot {
            mode: state.mode.clone(),
            me: state.own_entry().cloned(),
            is_host: state.is_host(),
            players: state.players.clone(),
            phase: state.round.phase(),
            current_letter: state.round.current_letter(),
            time_left: state.round.time_left(),
            answers: state.round.answers().clone(),
            corrections: state.round.corrections().clone(),
            round_score: state.round.round_score(),
            score_recorded: state.round.score_recorded(),
            total_score: state.total_score(),
        }
    }

    pub fn timers_running(&self) -> bool {
        self.timers.is_running()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_room_code() {
        assert_eq!(GameMode::Solo.room_code(), None);
        let online = GameMode::Online {
            room_code: "AB12CD".to_string(),
        };
        assert_eq!(online.room_code().map(String::as_str), Some("AB12CD"));
    }

    #[test]
    fn test_reset_bumps_epoch() {
        let mut state = SessionState::new();
        let first = state.reset(Some(GameMode::Solo), None);
        let second = state.reset(None, None);
        assert!(second > first);
        assert!(state.mode.is_none());
    }

    #[test]
    fn test_write_generation_moves_on_both_edges() {
        let mut state = SessionState::new();
        state.begin_write();
        assert_eq!((state.write_generation, state.writes_in_flight), (1, 1));
        state.end_write();
        assert_eq!((state.write_generation, state.writes_in_flight), (2, 0));
    }

    #[test]
    fn test_host_is_first_player() {
        let (record, alice) = PlayerRegistry::create_room("Alice").unwrap();
        let mut state = SessionState::new();
        state.reset(
            Some(GameMode::Online {
                room_code: "AB12CD".to_string(),
            }),
            Some(alice),
        );
        state.sync_roster(&record);
        assert!(state.is_host());
    }
}
