use std::fmt;

use autobus_types::{
    Answers, Category, CorrectionMark, Corrections, GameError, ROUND_SECONDS, RoomRecord,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::ScoringEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RoundPhase {
    /// In a room, no round played yet
    Lobby,
    /// Countdown running, answers editable
    Active,
    /// Review: corrections editable, score can be calculated
    Ended,
}

impl fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RoundPhase::Lobby => "waiting in the lobby",
            RoundPhase::Active => "a round is in progress",
            RoundPhase::Ended => "reviewing the last round",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RoundEndReason {
    TimeUp,
    Finished,
    ClosedByHost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundTransition {
    Started { letter: char },
    Ended(RoundEndReason),
}

/// Transitions applied to the shared record by the host.
pub struct RoundStateMachine;

impl RoundStateMachine {
    pub fn begin_round(record: &mut RoomRecord, letter: char, now_ms: i64) {
        record.current_letter = Some(letter);
        record.is_playing = true;
        record.time_left = ROUND_SECONDS;
        record.game_start_time = Some(now_ms);
    }

    /// Clears the round flags. The letter stays for the review screen.
    pub fn close_round(record: &mut RoomRecord) {
        record.is_playing = false;
        record.time_left = 0;
    }

    /// Seconds left in the record's round, derived from `game_start_time` so
    /// it does not depend on how often a client polls. Falls back to the
    /// advisory `time_left` for records without a start time.
    pub fn remaining_seconds(record: &RoomRecord, now_ms: i64) -> u32 {
        match record.game_start_time {
            Some(started) => {
                let elapsed = (now_ms - started).max(0) / 1000;
                ROUND_SECONDS.saturating_sub(u32::try_from(elapsed).unwrap_or(u32::MAX))
            }
            None => record.time_left.min(ROUND_SECONDS),
        }
    }
}

/// One client's view of the current round, plus its private edit buffers.
///
/// Answers and corrections never leave the client; only the computed score
/// is written back to the room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalRoundState {
    phase: RoundPhase,
    current_letter: Option<char>,
    time_left: u32,
    round_id: Option<i64>,
    /// A record without a start time marks a new round only by reopening
    /// after this client has seen it closed.
    seen_closed: bool,
    answers: Answers,
    corrections: Corrections,
    round_score: Option<u32>,
    score_recorded: bool,
}

impl Default for LocalRoundState {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalRoundState {
    pub fn new() -> Self {
        Self {
            phase: RoundPhase::Lobby,
            current_letter: None,
            time_left: ROUND_SECONDS,
            round_id: None,
            seen_closed: false,
            answers: Answers::default(),
            corrections: Corrections::default(),
            round_score: None,
            score_recorded: false,
        }
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn current_letter(&self) -> Option<char> {
        self.current_letter
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn answers(&self) -> &Answers {
        &self.answers
    }

    pub fn corrections(&self) -> &Corrections {
        &self.corrections
    }

    pub fn round_score(&self) -> Option<u32> {
        self.round_score
    }

    pub fn score_recorded(&self) -> bool {
        self.score_recorded
    }

    /// Start a round with a fresh answer sheet.
    pub fn begin(&mut self, letter: char, started_at_ms: i64) -> Result<(), GameError> {
        if self.phase == RoundPhase::Active {
            return Err(self.invalid_state());
        }
        self.start_fresh(letter, Some(started_at_ms), ROUND_SECONDS);
        Ok(())
    }

    /// One second of local countdown. Returns the end reason when it hits zero.
    pub fn tick(&mut self) -> Option<RoundEndReason> {
        if self.phase != RoundPhase::Active || self.time_left == 0 {
            return None;
        }

        self.time_left -= 1;
        if self.time_left == 0 {
            self.end();
            return Some(RoundEndReason::TimeUp);
        }
        None
    }

    /// End the round for this client only.
    pub fn finish(&mut self) -> Result<(), GameError> {
        if self.phase != RoundPhase::Active {
            return Err(self.invalid_state());
        }
        self.end();
        Ok(())
    }

    pub fn set_answer(&mut self, category: Category, text: &str) -> Result<(), GameError> {
        if self.phase != RoundPhase::Active {
            return Err(self.invalid_state());
        }
        self.answers[category] = text.to_string();
        Ok(())
    }

    pub fn toggle_correction(&mut self, category: Category) -> Result<CorrectionMark, GameError> {
        if self.phase != RoundPhase::Ended {
            return Err(self.invalid_state());
        }
        let mark = self.corrections[category].next();
        self.corrections[category] = mark;
        Ok(mark)
    }

    /// Compute this round's score. Allowed once the round has ended and
    /// until the score has been recorded.
    pub fn score(&mut self) -> Result<u32, GameError> {
        if self.phase != RoundPhase::Ended {
            return Err(self.invalid_state());
        }
        if self.score_recorded {
            return Err(GameError::ScoreAlreadyRecorded);
        }

        let score = ScoringEngine::compute_score(&self.answers, &self.corrections);
        self.round_score = Some(score);
        Ok(score)
    }

    pub fn mark_recorded(&mut self) {
        self.score_recorded = true;
    }

    /// Fold a freshly fetched shared record into the local view.
    pub fn observe(&mut self, record: &RoomRecord, now_ms: i64) -> Option<RoundTransition> {
        let same_round = match record.game_start_time {
            Some(started) => self.round_id == Some(started),
            None => {
                self.phase != RoundPhase::Lobby
                    && !self.seen_closed
                    && self.current_letter == record.current_letter
            }
        };

        if !record.is_playing {
            self.current_letter = record.current_letter;
            self.seen_closed = true;
            return match self.phase {
                RoundPhase::Active => {
                    info!("Round closed by host");
                    self.end();
                    Some(RoundTransition::Ended(RoundEndReason::ClosedByHost))
                }
                RoundPhase::Lobby => {
                    // A closed round's zero is not this client's countdown
                    self.time_left = ROUND_SECONDS;
                    None
                }
                RoundPhase::Ended => None,
            };
        }

        let remaining = RoundStateMachine::remaining_seconds(record, now_ms);

        if same_round {
            return match self.phase {
                RoundPhase::Active if remaining == 0 => {
                    self.time_left = 0;
                    self.end();
                    Some(RoundTransition::Ended(RoundEndReason::TimeUp))
                }
                RoundPhase::Active => {
                    if remaining != self.time_left {
                        debug!(local = self.time_left, remaining, "resynchronised countdown");
                    }
                    self.time_left = remaining;
                    None
                }
                // Finished locally; stays in review until a new round appears
                _ => None,
            };
        }

        let letter = match record.current_letter {
            Some(letter) if remaining > 0 => letter,
            _ => {
                // Not joinable: already over, or no letter to play
                if self.phase == RoundPhase::Active {
                    self.time_left = 0;
                    self.end();
                    return Some(RoundTransition::Ended(RoundEndReason::TimeUp));
                }
                return None;
            }
        };

        info!("Joining round with letter {} ({}s left)", letter, remaining);
        self.start_fresh(letter, record.game_start_time, remaining);
        Some(RoundTransition::Started { letter })
    }

    fn start_fresh(&mut self, letter: char, round_id: Option<i64>, time_left: u32) {
        self.phase = RoundPhase::Active;
        self.current_letter = Some(letter);
        self.time_left = time_left;
        self.round_id = round_id;
        self.seen_closed = false;
        self.answers = Answers::default();
        self.corrections = Corrections::default();
        self.round_score = None;
        self.score_recorded = false;
    }

    fn end(&mut self) {
        self.phase = RoundPhase::Ended;
        self.corrections = Corrections::default();
    }

    fn invalid_state(&self) -> GameError {
        GameError::InvalidGameState {
            current_state: self.phase.to_string(),
        }
    }
}
