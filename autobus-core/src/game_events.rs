use autobus_types::{Player, PlayerId, RoomCode};

use crate::RoundEndReason;

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    RoomCreated {
        room_code: RoomCode,
        host: Player,
    },
    PlayerJoined {
        room_code: RoomCode,
        player: Player,
    },
    /// The polled player list differs from the previous local view
    RosterChanged {
        room_code: RoomCode,
        players: Vec<Player>,
    },
    /// `room_code` is `None` for solo rounds
    RoundStarted {
        room_code: Option<RoomCode>,
        letter: char,
    },
    RoundEnded {
        room_code: Option<RoomCode>,
        reason: RoundEndReason,
    },
    ScoreRecorded {
        room_code: Option<RoomCode>,
        player_id: Option<PlayerId>,
        round_score: u32,
        total: u32,
    },
    RoomLeft {
        room_code: RoomCode,
    },
}

impl GameEvent {
    pub fn room_code(&self) -> Option<&RoomCode> {
        match self {
            GameEvent::RoomCreated { room_code, .. } => Some(room_code),
            GameEvent::PlayerJoined { room_code, .. } => Some(room_code),
            GameEvent::RosterChanged { room_code, .. } => Some(room_code),
            GameEvent::RoundStarted { room_code, .. } => room_code.as_ref(),
            GameEvent::RoundEnded { room_code, .. } => room_code.as_ref(),
            GameEvent::ScoreRecorded { room_code, .. } => room_code.as_ref(),
            GameEvent::RoomLeft { room_code } => Some(room_code),
        }
    }
}

/// Event handler trait for processing game events
pub trait GameEventHandler: Send {
    fn handle_event(&mut self, event: GameEvent);
}

/// Simple event bus for distributing game events
pub struct GameEventBus {
    handlers: Vec<Box<dyn GameEventHandler>>,
}

impl GameEventBus {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn add_handler(&mut self, handler: Box<dyn GameEventHandler>) {
        self.handlers.push(handler);
    }

    pub fn publish(&mut self, event: GameEvent) {
        for handler in &mut self.handlers {
            handler.handle_event(event.clone());
        }
    }
}

impl Default for GameEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct TestHandler {
        events: Arc<Mutex<Vec<GameEvent>>>,
    }

    impl GameEventHandler for TestHandler {
        fn handle_event(&mut self, event: GameEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    #[test]
    fn test_event_bus_fans_out() {
        let mut bus = GameEventBus::new();
        let first = Arc::new(Mutex::new(Vec::new()));
        let second = Arc::new(Mutex::new(Vec::new()));

        bus.add_handler(Box::new(TestHandler {
            events: first.clone(),
        }));
        bus.add_handler(Box::new(TestHandler {
            events: second.clone(),
        }));

        let event = GameEvent::RoomLeft {
            room_code: "ABC123".to_string(),
        };
        bus.publish(event.clone());

        assert_eq!(*first.lock().unwrap(), vec![event.clone()]);
        assert_eq!(*second.lock().unwrap(), vec![event]);
    }

    #[test]
    fn test_solo_events_have_no_room() {
        let event = GameEvent::RoundStarted {
            room_code: None,
            letter: 'A',
        };
        assert_eq!(event.room_code(), None);
    }
}
