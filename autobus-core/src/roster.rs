use autobus_types::{GameError, Player, PlayerId, RoomRecord};
use tracing::info;

use crate::generation::new_player_id;

/// Membership, host designation and score bookkeeping on a [`RoomRecord`].
pub struct PlayerRegistry;

impl PlayerRegistry {
    /// Trimmed display name, or `None` when blank.
    pub fn validate_name(name: &str) -> Option<String> {
        let name = name.trim();
        (!name.is_empty()).then(|| name.to_string())
    }

    pub fn new_player(name: &str, is_host: bool) -> Player {
        Player {
            id: new_player_id(),
            name: name.to_string(),
            score: 0,
            is_host,
        }
    }

    /// Build the first record of a room, with `host_name` as its only player.
    pub fn create_room(host_name: &str) -> Result<(RoomRecord, Player), GameError> {
        let name = Self::validate_name(host_name).ok_or(GameError::NameRequired)?;
        let host = Self::new_player(&name, true);

        let record = RoomRecord {
            players: vec![host.clone()],
            host_id: Some(host.id.clone()),
            ..RoomRecord::default()
        };

        Ok((record, host))
    }

    /// Append a new non-host player in join order.
    pub fn join(record: &mut RoomRecord, name: &str) -> Result<Player, GameError> {
        let name = Self::validate_name(name).ok_or(GameError::NameRequired)?;
        let player = Self::new_player(&name, false);

        record.players.push(player.clone());
        if record.host_id.is_none() {
            record.host_id = Self::host(record).map(|p| p.id.clone());
        }

        info!(
            "Player {} ({}) joined; room now has {} players",
            player.name,
            player.id,
            record.players.len()
        );
        Ok(player)
    }

    /// The first player in join order is always the host.
    pub fn host(record: &RoomRecord) -> Option<&Player> {
        record.players.first()
    }

    pub fn is_host(record: &RoomRecord, player_id: &str) -> bool {
        Self::host(record).is_some_and(|p| p.id == player_id)
    }

    /// Add a round score to a player's running total, matched by id.
    pub fn apply_round_score(
        record: &mut RoomRecord,
        player_id: &PlayerId,
        points: u32,
    ) -> Result<u32, GameError> {
        let player = record
            .player_mut(player_id)
            .ok_or_else(|| GameError::PlayerNotFound {
                player_id: player_id.clone(),
            })?;

        player.score = player.score.saturating_add(points);
        Ok(player.score)
    }
}
