use std::sync::Arc;

use autobus_types::RoomRecord;
use tracing::debug;

use crate::{KeyValueStore, StoreError, StoreResult};

pub const ROOM_KEY_PREFIX: &str = "game:";

/// Typed access to the shared room records, one JSON value per room code.
#[derive(Clone)]
pub struct RoomStore {
    store: Arc<dyn KeyValueStore>,
}

impl RoomStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn room_key(room_code: &str) -> String {
        format!("{ROOM_KEY_PREFIX}{room_code}")
    }

    /// `Ok(None)` means the room does not exist (yet).
    pub async fn get(&self, room_code: &str) -> StoreResult<Option<RoomRecord>> {
        let key = Self::room_key(room_code);

        let Some(raw) = self.store.get(&key, true).await? else {
            return Ok(None);
        };

        let record = serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
            key: key.clone(),
            source,
        })?;
        debug!("Fetched {}", key);
        Ok(Some(record))
    }

    pub async fn set(&self, room_code: &str, record: &RoomRecord) -> StoreResult<()> {
        let key = Self::room_key(room_code);
        let raw = serde_json::to_string(record).map_err(|source| StoreError::Corrupt {
            key: key.clone(),
            source,
        })?;

        self.store.set(&key, &raw, true).await?;
        debug!("Wrote {} ({} players)", key, record.players.len());
        Ok(())
    }
}
