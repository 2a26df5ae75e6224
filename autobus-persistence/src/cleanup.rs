use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use sea_orm::DbErr;
use tracing::info;

use crate::repositories::StoreEntryRepository;

/// Expires store entries nobody has written for a while. Rooms are never
/// deleted by the game itself, so this bounds how long an abandoned room lingers.
pub struct StoreCleanup {
    pub entry_ttl: Duration,
}

impl Default for StoreCleanup {
    fn default() -> Self {
        Self {
            entry_ttl: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl StoreCleanup {
    pub fn new(entry_ttl: Duration) -> Self {
        Self { entry_ttl }
    }

    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        TimeDelta::from_std(self.entry_ttl)
            .ok()
            .and_then(|ttl| now.checked_sub_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    pub async fn purge_expired(&self, repository: &StoreEntryRepository) -> Result<u64, DbErr> {
        let removed = repository
            .delete_untouched_since(self.cutoff(Utc::now()))
            .await?;

        if removed > 0 {
            info!("Expired {} store entries older than {:?}", removed, self.entry_ttl);
        }
        Ok(removed)
    }
}
