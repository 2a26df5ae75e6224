#![allow(dead_code)]

use autobus_core::{LocalRoundState, PlayerRegistry, RoundStateMachine};
use autobus_types::{Category, CorrectionMark, Player, RoomRecord};

pub const T0: i64 = 1_700_000_000_000;

/// A room created by `host` with the other names joined in order
pub fn create_room_with(host: &str, joiners: &[&str]) -> (RoomRecord, Vec<Player>) {
    let (mut record, host) = PlayerRegistry::create_room(host).unwrap();
    let mut players = vec![host];
    for name in joiners {
        players.push(PlayerRegistry::join(&mut record, name).unwrap());
    }
    (record, players)
}

/// Simulates the JSON round trip every read and write goes through
pub fn through_store(record: &RoomRecord) -> RoomRecord {
    let json = serde_json::to_string(record).unwrap();
    serde_json::from_str(&json).unwrap()
}

pub fn started_record(record: &RoomRecord, letter: char, at: i64) -> RoomRecord {
    let mut next = record.clone();
    RoundStateMachine::begin_round(&mut next, letter, at);
    next
}

/// Mark the first `correct` categories correct and the rest wrong
pub fn mark_round(state: &mut LocalRoundState, correct: usize) {
    for (index, category) in Category::ALL.into_iter().enumerate() {
        let target = if index < correct {
            CorrectionMark::Correct
        } else {
            CorrectionMark::Wrong
        };
        while state.corrections()[category] != target {
            state.toggle_correction(category).unwrap();
        }
    }
}
