use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Errors a player can see. Background polling never produces one of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, thiserror::Error)]
#[ts(export)]
pub enum GameError {
    #[error("Please enter your name")]
    NameRequired,
    #[error("Please enter your name and room code")]
    NameAndRoomCodeRequired,
    #[error("Room not found")]
    RoomNotFound { room_code: String },
    #[error("Error creating room")]
    CreateFailed { message: String },
    #[error("Error joining room")]
    JoinFailed { message: String },
    #[error("Error saving score")]
    ScoreSyncFailed { message: String },
    #[error("Player {player_id} is not in the room")]
    PlayerNotFound { player_id: String },
    #[error("Only the host can start a round")]
    NotHost,
    #[error("Not in a room")]
    NotInRoom,
    #[error("Score already recorded for this round")]
    ScoreAlreadyRecorded,
    #[error("Action not available while {current_state}")]
    InvalidGameState { current_state: String },
}

impl GameError {
    /// Validation errors are raised before any store access.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            GameError::NameRequired | GameError::NameAndRoomCodeRequired
        )
    }
}
