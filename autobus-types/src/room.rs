use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub type PlayerId = String;
pub type RoomCode = String;

/// Length of a round in seconds, and the `timeLeft` a record reports when the field is absent.
pub const ROUND_SECONDS: u32 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    #[serde(default)]
    pub score: u32,
    #[serde(default)]
    pub is_host: bool,
}

/// The single shared value stored per room code.
///
/// Every client reads and rewrites this record wholesale; there is no
/// field-level merging, so the last writer wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RoomRecord {
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default, with = "letter_field")]
    #[ts(type = "string")]
    pub current_letter: Option<char>,
    #[serde(default)]
    pub is_playing: bool,
    #[serde(default = "default_time_left")]
    pub time_left: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub host_id: Option<PlayerId>,
    /// Unix epoch milliseconds at which the current round started
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub game_start_time: Option<i64>,
}

fn default_time_left() -> u32 {
    ROUND_SECONDS
}

impl Default for RoomRecord {
    fn default() -> Self {
        Self {
            players: Vec::new(),
            current_letter: None,
            is_playing: false,
            time_left: ROUND_SECONDS,
            host_id: None,
            game_start_time: None,
        }
    }
}

impl RoomRecord {
    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn player_mut(&mut self, player_id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == player_id)
    }
}

/// `currentLetter` travels as a string: `""` when no round is active.
mod letter_field {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(letter: &Option<char>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match letter {
            Some(c) => serializer.collect_str(c),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<char>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        let mut chars = raw.trim().chars();
        Ok(match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphabetic() => Some(c.to_ascii_uppercase()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_fields_use_defaults() {
        let record: RoomRecord = serde_json::from_str("{}").unwrap();

        assert!(record.players.is_empty());
        assert_eq!(record.current_letter, None);
        assert!(!record.is_playing);
        assert_eq!(record.time_left, 60);
        assert_eq!(record.host_id, None);
        assert_eq!(record.game_start_time, None);
    }

    #[test]
    fn test_wire_field_names() {
        let record = RoomRecord {
            players: vec![Player {
                id: "1700000000000".to_string(),
                name: "Alice".to_string(),
                score: 30,
                is_host: true,
            }],
            current_letter: Some('M'),
            is_playing: true,
            time_left: 60,
            host_id: Some("1700000000000".to_string()),
            game_start_time: Some(1_700_000_000_500),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["currentLetter"], "M");
        assert_eq!(json["isPlaying"], true);
        assert_eq!(json["timeLeft"], 60);
        assert_eq!(json["hostId"], "1700000000000");
        assert_eq!(json["gameStartTime"], 1_700_000_000_500i64);
        assert_eq!(json["players"][0]["isHost"], true);
        assert_eq!(json["players"][0]["score"], 30);
    }

    #[test]
    fn test_empty_letter_means_no_round() {
        let json = serde_json::to_value(RoomRecord::default()).unwrap();
        assert_eq!(json["currentLetter"], "");
        assert!(json.get("hostId").is_none());
        assert!(json.get("gameStartTime").is_none());
    }

    #[test]
    fn test_letter_normalisation() {
        let lower: RoomRecord = serde_json::from_str(r#"{"currentLetter":"k"}"#).unwrap();
        assert_eq!(lower.current_letter, Some('K'));

        let garbage: RoomRecord = serde_json::from_str(r#"{"currentLetter":"AB"}"#).unwrap();
        assert_eq!(garbage.current_letter, None);

        let digit: RoomRecord = serde_json::from_str(r#"{"currentLetter":"7"}"#).unwrap();
        assert_eq!(digit.current_letter, None);

        let null: RoomRecord = serde_json::from_str(r#"{"currentLetter":null}"#).unwrap();
        assert_eq!(null.current_letter, None);
    }

    #[test]
    fn test_player_without_score_or_host_flag() {
        let record: RoomRecord =
            serde_json::from_str(r#"{"players":[{"id":"a","name":"Bob"}]}"#).unwrap();
        let bob = record.player("a").unwrap();
        assert_eq!(bob.score, 0);
        assert!(!bob.is_host);
    }
}
